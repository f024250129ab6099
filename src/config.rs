use std::env;

/// Server configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub schema_path: String,
    /// Mailgun credentials. When the key is absent the server falls back
    /// to logging OTPs instead of mailing them.
    pub mailgun_api_key: Option<String>,
    pub mailgun_domain: String,
    pub mailgun_from: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "bhproperties.sqlite3".into()),
            schema_path: env::var("SCHEMA_PATH").unwrap_or_else(|_| "sql/schema.sql".into()),
            mailgun_api_key: env::var("MAILGUN_API_KEY").ok(),
            mailgun_domain: env::var("MAILGUN_DOMAIN").unwrap_or_else(|_| "mg.example.com".into()),
            mailgun_from: env::var("MAILGUN_FROM").unwrap_or_else(|_| "noreply@example.com".into()),
        }
    }
}
