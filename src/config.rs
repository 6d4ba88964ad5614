/// Default database location, created on first run.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://homeroom.db?mode=rwc";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5005;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
}

impl Config {
    /// Reads `DATABASE_URL` and `PORT` from the environment, honoring a
    /// `.env` file when one is present. Anything missing or unparsable falls
    /// back to the defaults.
    pub fn from_env() -> Self {
        let database_url =
            dotenv::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
        let port = dotenv::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { database_url, port }
    }
}
