use crate::client::ProviderClient;
use crate::errors::{Error, Result};
use crate::model::{AirQualityResponse, ProviderEnvelope};
use async_trait::async_trait;
use tracing::{error, warn};

pub const FETCH_FAILED: &str = "Failed to fetch nearest city";

/// Source of current pollution readings for a coordinate.
#[async_trait]
pub trait PollutionSource: Send + Sync {
    async fn nearest_city(&self, lat: f64, lon: f64) -> Result<AirQualityResponse>;
}

/// AirVisual-style provider: `GET <base>?lat=..&lon=..&key=..`.
#[derive(Debug, Clone)]
pub struct AirVisualGateway {
    client: ProviderClient,
    api_key: String,
}

impl AirVisualGateway {
    pub fn new(client: ProviderClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<AirQualityResponse> {
        let query = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("key", self.api_key.clone()),
        ];
        let envelope: ProviderEnvelope = self.client.get_json("", &query).await?;
        if let Some(status) = envelope.status.as_deref().filter(|s| *s != "success") {
            warn!("Provider reported status {:?} alongside pollution data", status);
        }
        Ok(AirQualityResponse::new(envelope.data.current.pollution))
    }
}

#[async_trait]
impl PollutionSource for AirVisualGateway {
    async fn nearest_city(&self, lat: f64, lon: f64) -> Result<AirQualityResponse> {
        self.fetch(lat, lon).await.map_err(|e| {
            error!("Error fetching nearest city: {}", e);
            Error::bad_request(FETCH_FAILED)
        })
    }
}
