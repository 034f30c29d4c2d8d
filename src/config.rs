use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub default_country: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 10,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            max_body_size: 1_048_576,
            cors_origins: Vec::new(),
            default_country: "Polska".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let store = match env_or("NEXTFAB_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => return Err(format!("Invalid NEXTFAB_STORE '{other}': expected postgres or memory")),
        };

        let database_url = match store {
            StoreBackend::Postgres => Some(env_required("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        let db_max_connections: u32 = env_or("NEXTFAB_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid NEXTFAB_DB_MAX_CONNECTIONS: {e}"))?;

        let host: IpAddr = env_or("NEXTFAB_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid NEXTFAB_HOST: {e}"))?;

        let port: u16 = env_or("NEXTFAB_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid NEXTFAB_PORT: {e}"))?;

        let max_body_size: usize = env_or("NEXTFAB_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid NEXTFAB_MAX_BODY_SIZE: {e}"))?;

        let cors_origins = env_or("NEXTFAB_CORS_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let default_country = env_or("NEXTFAB_DEFAULT_COUNTRY", "Polska");
        let log_level = env_or("NEXTFAB_LOG_LEVEL", "info");

        Ok(Config {
            store,
            database_url,
            db_max_connections,
            host,
            port,
            max_body_size,
            cors_origins,
            default_country,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
