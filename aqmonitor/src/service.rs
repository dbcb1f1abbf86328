use crate::config::DisplayFormat;
use crate::db::SnapshotStore;
use crate::errors::{Error, Result};
use crate::gateway::PollutionSource;
use crate::metrics::{LOOKUPS_TOTAL, SNAPSHOTS_TOTAL, SNAPSHOT_FAILURES_TOTAL};
use crate::model::{AirQualityRecord, AirQualityResponse, Coordinate, MostPollutedTime, NewAirQuality};
use chrono::{Local, TimeZone};
use std::fmt::{Display, Write};
use std::sync::Arc;
use tracing::{error, info};

pub const SAVE_FAILED: &str = "Failed to save air quality data";
pub const NO_DATA: &str = "No air quality data found";
pub const MOST_POLLUTED_FAILED: &str = "Failed to fetch most polluted time";

/// Coordinates of Paris, France: the default snapshot location.
pub const PARIS: Coordinate = Coordinate {
    lat: 48.856613,
    lon: 2.352222,
};

/// On-demand lookups, scheduled snapshots and the most-polluted report.
#[derive(Clone)]
pub struct AirQualityService {
    source: Arc<dyn PollutionSource>,
    store: Arc<dyn SnapshotStore>,
    snapshot_location: Coordinate,
    display: DisplayFormat,
}

impl AirQualityService {
    pub fn new(
        source: Arc<dyn PollutionSource>,
        store: Arc<dyn SnapshotStore>,
        snapshot_location: Coordinate,
        display: DisplayFormat,
    ) -> Self {
        Self {
            source,
            store,
            snapshot_location,
            display,
        }
    }

    pub fn snapshot_location(&self) -> Coordinate {
        self.snapshot_location
    }

    /// Current reading for `(lat, lon)`. Gateway failures pass through as-is.
    pub async fn lookup(&self, lat: f64, lon: f64) -> Result<AirQualityResponse> {
        LOOKUPS_TOTAL.inc();
        self.source.nearest_city(lat, lon).await
    }

    /// Fetches the reading for the snapshot location and appends its US AQI
    /// to the store.
    ///
    /// Any failure is logged with its cause and reported as a
    /// [`Error::BadRequest`] carrying [`SAVE_FAILED`].
    pub async fn capture_snapshot(&self) -> Result<AirQualityRecord> {
        match self.try_capture_snapshot().await {
            Ok(record) => {
                SNAPSHOTS_TOTAL.inc();
                info!("Air quality data saved: {:?}", record);
                Ok(record)
            }
            Err(e) => {
                SNAPSHOT_FAILURES_TOTAL.inc();
                error!("Error saving air quality data: {}", e);
                Err(Error::bad_request(SAVE_FAILED))
            }
        }
    }

    async fn try_capture_snapshot(&self) -> Result<AirQualityRecord> {
        let Coordinate { lat, lon } = self.snapshot_location;
        let reading = self.lookup(lat, lon).await?;
        info!("Air quality data fetched: {:?}", reading);

        let record = NewAirQuality {
            aqi: reading.pollution().aqius,
            latitude: lat,
            longitude: lon,
        };
        self.store.insert(record).await
    }

    /// The stored record with the highest AQI, formatted for display.
    pub async fn most_polluted_time(&self) -> Result<MostPollutedTime> {
        let record = match self.store.most_polluted().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("No air quality data found.");
                return Err(Error::bad_request(NO_DATA));
            }
            Err(e) => {
                error!("Error fetching most polluted time: {}", e);
                return Err(Error::bad_request(MOST_POLLUTED_FAILED));
            }
        };

        self.format_most_polluted_time(&record).map_err(|e| {
            error!("Error fetching most polluted time: {}", e);
            Error::bad_request(MOST_POLLUTED_FAILED)
        })
    }

    /// Renders `created_at` in the host's local timezone.
    pub fn format_most_polluted_time(&self, record: &AirQualityRecord) -> Result<MostPollutedTime> {
        format_in(record, &Local, &self.display)
    }
}

/// Renders `record.created_at` in `tz` using the configured patterns.
pub fn format_in<Tz>(record: &AirQualityRecord, tz: &Tz, display: &DisplayFormat) -> Result<MostPollutedTime>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let at = record.created_at.with_timezone(tz);

    // Invalid patterns surface as fmt::Error instead of panicking in to_string()
    let mut date = String::new();
    write!(date, "{}", at.format(&display.date))
        .map_err(|_| Error::bad_request(format!("invalid date format {:?}", display.date)))?;
    let mut time = String::new();
    write!(time, "{}", at.format(&display.time))
        .map_err(|_| Error::bad_request(format!("invalid time format {:?}", display.time)))?;

    info!("Most polluted time: {} {}", date, time);

    Ok(MostPollutedTime {
        id: record.id,
        aqi: record.aqi,
        date,
        time,
    })
}
