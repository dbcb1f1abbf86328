use crate::service::AirQualityService;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{error, info};

/// Captures a snapshot every `period`, starting one period from now.
///
/// Each tick runs on its own task, so a slow run never delays the next one
/// and overlapping runs are independent. Never returns.
pub async fn run_scheduler(service: AirQualityService, period: Duration) {
    info!("Starting snapshot scheduler with period={:?}", period);

    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;
        let service = service.clone();
        tokio::spawn(async move {
            run_snapshot(&service).await;
        });
    }
}

/// One scheduled run. Failures are logged and absorbed here.
pub async fn run_snapshot(service: &AirQualityService) {
    match service.capture_snapshot().await {
        Ok(saved) => info!("Air quality data saved: {:?}", saved),
        Err(e) => error!("Error checking and saving air quality: {}", e),
    }
}
