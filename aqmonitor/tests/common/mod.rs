#![allow(dead_code)]

use aqmonitor::config::DisplayFormat;
use aqmonitor::db::SnapshotStore;
use aqmonitor::errors::{Error, Result};
use aqmonitor::gateway::{PollutionSource, FETCH_FAILED};
use aqmonitor::model::{AirQualityRecord, AirQualityResponse, NewAirQuality, Pollution};
use aqmonitor::service::{AirQualityService, PARIS};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn pollution(aqius: i32) -> Pollution {
    Pollution {
        ts: "2021-09-29T14:00:00.000Z".to_string(),
        aqius,
        mainus: "p2".to_string(),
        aqicn: 21,
        maincn: "p1".to_string(),
    }
}

/// Pollution source that fails its first `failures` calls.
#[derive(Default)]
pub struct ScriptedSource {
    pub aqius: i32,
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn ok(aqius: i32) -> Self {
        Self {
            aqius,
            ..Default::default()
        }
    }

    pub fn failing_first(failures: usize, aqius: i32) -> Self {
        Self {
            aqius,
            failures,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PollutionSource for ScriptedSource {
    async fn nearest_city(&self, _lat: f64, _lon: f64) -> Result<AirQualityResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(Error::bad_request(FETCH_FAILED));
        }
        Ok(AirQualityResponse::new(pollution(self.aqius)))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<AirQualityRecord>>,
}

impl MemoryStore {
    pub fn with_aqis(aqis: &[i32]) -> Self {
        let base: DateTime<Utc> = "2021-09-29T14:00:00Z".parse().unwrap();
        let rows = aqis
            .iter()
            .enumerate()
            .map(|(i, aqi)| AirQualityRecord {
                id: i as i32 + 1,
                aqi: *aqi,
                latitude: PARIS.lat,
                longitude: PARIS.lon,
                created_at: base + Duration::hours(i as i64),
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn insert(&self, record: NewAirQuality) -> Result<AirQualityRecord> {
        let mut rows = self.rows.lock().unwrap();
        let saved = AirQualityRecord {
            id: rows.len() as i32 + 1,
            aqi: record.aqi,
            latitude: record.latitude,
            longitude: record.longitude,
            created_at: Utc::now(),
        };
        rows.push(saved.clone());
        Ok(saved)
    }

    async fn most_polluted(&self) -> Result<Option<AirQualityRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().max_by_key(|r| r.aqi).cloned())
    }
}

pub fn service(source: Arc<ScriptedSource>, store: Arc<MemoryStore>) -> AirQualityService {
    AirQualityService::new(source, store, PARIS, DisplayFormat::default())
}
