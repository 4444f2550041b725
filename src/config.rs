use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub admin_key: Option<String>,
    /// Interval between inbox refreshes in `inbox --watch`.
    /// Set via GEARHUB_REFRESH_SECS env var. Default: 30.
    pub refresh_secs: u64,
    pub smtp: Option<SmtpConfig>,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    /// Sender address used by every mail transport.
    pub email_from: String,
    /// Allowed CORS origin for the dashboard. Localhost is always allowed.
    pub dashboard_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "postgres://localhost/gearhub".into(),
            admin_key: None,
            refresh_secs: 30,
            smtp: None,
            email_api_url: None,
            email_api_key: None,
            email_from: "GearHub <no-reply@gearhub.local>".into(),
            dashboard_origin: "http://localhost:3000".into(),
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let defaults = Config::default();

    let smtp = match std::env::var("SMTP_HOST") {
        Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
            host: host.trim().to_string(),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
        }),
        _ => None,
    };

    let admin_key = std::env::var("GEARHUB_ADMIN_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if admin_key.is_none() {
        tracing::warn!("GEARHUB_ADMIN_KEY is not set; admin routes will reject every request");
    }

    Ok(Config {
        port: std::env::var("GEARHUB_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(defaults.port),
        database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        admin_key,
        refresh_secs: std::env::var("GEARHUB_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.refresh_secs),
        smtp,
        email_api_url: std::env::var("EMAIL_API_URL").ok().filter(|u| !u.is_empty()),
        email_api_key: std::env::var("EMAIL_API_KEY").ok(),
        email_from: std::env::var("EMAIL_FROM").unwrap_or(defaults.email_from),
        dashboard_origin: std::env::var("DASHBOARD_ORIGIN").unwrap_or(defaults.dashboard_origin),
    })
}
