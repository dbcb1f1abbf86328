use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point on the map, in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Pollution block as reported by the provider for a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pollution {
    /// Reading timestamp, passed through as the provider formats it.
    pub ts: String,
    /// AQI on the US EPA scale.
    pub aqius: i32,
    /// Dominant pollutant code for the US scale (e.g. "p2").
    pub mainus: String,
    /// AQI on the China MEP scale.
    pub aqicn: i32,
    /// Dominant pollutant code for the CN scale.
    pub maincn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionResult {
    #[serde(rename = "Pollution")]
    pub pollution: Pollution,
}

/// Response body of the nearest-city lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityResponse {
    #[serde(rename = "Result")]
    pub result: PollutionResult,
}

impl AirQualityResponse {
    pub fn new(pollution: Pollution) -> Self {
        Self {
            result: PollutionResult { pollution },
        }
    }

    pub fn pollution(&self) -> &Pollution {
        &self.result.pollution
    }
}

/// Envelope returned by the provider's nearest-city endpoint.
#[derive(Debug, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    pub data: ProviderData,
}

#[derive(Debug, Deserialize)]
pub struct ProviderData {
    pub current: ProviderCurrent,
}

#[derive(Debug, Deserialize)]
pub struct ProviderCurrent {
    pub pollution: Pollution,
}

/// Row of the append-only `air_quality` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityRecord {
    pub id: i32,
    pub aqi: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

/// Values supplied by a snapshot; `id` and `created_at` come from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewAirQuality {
    pub aqi: i32,
    pub latitude: f64,
    pub longitude: f64,
}

/// Response body of the most-polluted-time report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostPollutedTime {
    pub id: i32,
    pub aqi: i32,
    pub date: String,
    pub time: String,
}
