use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Opens the pool, retrying with a doubling delay before giving up for good.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let mut delay = CONNECT_BASE_DELAY;
    let mut attempt = 1;

    loop {
        match SqlitePoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    "database connect attempt {attempt}/{CONNECT_ATTEMPTS} failed: {err}; retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!(
                    "could not open database at {database_url} after {CONNECT_ATTEMPTS} attempts"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_to_an_in_memory_database() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }
}
