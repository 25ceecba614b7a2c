use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub room_slug: String,
    pub room_case_id: String,
    pub room_data_path: PathBuf,
    pub keep_alive: Duration,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let room_slug = env::var("ROOM_SLUG").unwrap_or_else(|_| "case01".to_string());
        if room_slug.is_empty() || room_slug.contains('/') {
            return Err(ConfigError::InvalidRoomSlug(room_slug));
        }

        let room_case_id =
            env::var("ROOM_CASE_ID").unwrap_or_else(|_| "SCIB-CC-1991-022".to_string());

        let room_data_path = env::var("ROOM_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data").join("room").join("case01.json"));

        let keep_alive_secs: u64 = env::var("ROOM_KEEP_ALIVE_SECS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidKeepAlive)?;
        if keep_alive_secs == 0 {
            return Err(ConfigError::InvalidKeepAlive);
        }

        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "caseroom".to_string());

        let metrics_port = env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9000".to_string())
            .parse()
            .unwrap_or(9000);

        Ok(Config {
            server_host,
            server_port,
            room_slug,
            room_case_id,
            room_data_path,
            keep_alive: Duration::from_secs(keep_alive_secs),
            otel_exporter_endpoint,
            service_name,
            metrics_port,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            room_slug: "case01".to_string(),
            room_case_id: "SCIB-CC-1991-022".to_string(),
            room_data_path: PathBuf::from("data").join("room").join("case01.json"),
            keep_alive: Duration::from_secs(20),
            otel_exporter_endpoint: None,
            service_name: "caseroom".to_string(),
            metrics_port: 9000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("ROOM_KEEP_ALIVE_SECS must be a positive number of seconds")]
    InvalidKeepAlive,

    #[error("Invalid room slug: {0:?}")]
    InvalidRoomSlug(String),
}
