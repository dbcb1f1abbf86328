use crate::model::Coordinate;
use clap::Parser;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

/// Process configuration, read once at start from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "aqmonitor", version, about = "Air-quality snapshot service")]
pub struct Config {
    #[arg(long, env = "DATABASE_HOST", default_value = "localhost")]
    pub database_host: String,

    #[arg(long, env = "DATABASE_PORT", default_value_t = 5432)]
    pub database_port: u16,

    #[arg(long, env = "DATABASE_USER", default_value = "postgres")]
    pub database_user: String,

    #[arg(long, env = "DATABASE_PASSWORD", default_value = "", hide_env_values = true)]
    pub database_password: String,

    #[arg(long, env = "DATABASE_NAME", default_value = "air_quality")]
    pub database_name: String,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Base URL of the provider's nearest-city endpoint
    #[arg(long, env = "API_URL")]
    pub api_url: String,

    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "SNAPSHOT_INTERVAL_SECS", default_value_t = 60)]
    pub snapshot_interval_secs: u64,

    /// Latitude of the location captured by scheduled snapshots (Paris)
    #[arg(long, env = "SNAPSHOT_LAT", default_value_t = 48.856613, allow_negative_numbers = true)]
    pub snapshot_lat: f64,

    /// Longitude of the location captured by scheduled snapshots (Paris)
    #[arg(long, env = "SNAPSHOT_LON", default_value_t = 2.352222, allow_negative_numbers = true)]
    pub snapshot_lon: f64,

    /// strftime pattern for the reported date, in the host's local timezone
    #[arg(long, env = "DATE_FORMAT", default_value = "%-m/%-d/%Y")]
    pub date_format: String,

    /// strftime pattern for the reported time, in the host's local timezone
    #[arg(long, env = "TIME_FORMAT", default_value = "%-I:%M:%S %p")]
    pub time_format: String,
}

impl Config {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.database_host)
            .port(self.database_port)
            .username(&self.database_user)
            .password(&self.database_password)
            .database(&self.database_name)
    }

    pub fn snapshot_location(&self) -> Coordinate {
        Coordinate {
            lat: self.snapshot_lat,
            lon: self.snapshot_lon,
        }
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs.max(1))
    }

    pub fn display_format(&self) -> DisplayFormat {
        DisplayFormat {
            date: self.date_format.clone(),
            time: self.time_format.clone(),
        }
    }
}

/// How `created_at` is rendered in the most-polluted-time report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    pub date: String,
    pub time: String,
}

impl Default for DisplayFormat {
    // en-US style, e.g. "9/29/2021" and "2:00:00 PM"
    fn default() -> Self {
        Self {
            date: "%-m/%-d/%Y".to_string(),
            time: "%-I:%M:%S %p".to_string(),
        }
    }
}
