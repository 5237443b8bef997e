use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub redis_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub due_reading_scan_hours: u64,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

impl SmtpConfig {
    /// Mail is skipped entirely when no SMTP host is configured.
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .context("JWT_MAXAGE must be set")?
            .parse::<i64>()
            .context("JWT_MAXAGE must be a number of minutes")?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let redis_url = std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:8000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let due_reading_scan_hours = std::env::var("DUE_READING_SCAN_HOURS")
            .ok()
            .and_then(|h| h.parse::<u64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);

        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_default(),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "Rentnest <noreply@rentnest.app>".to_string()),
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            redis_url,
            cors_origins,
            due_reading_scan_hours,
            smtp,
        })
    }
}
