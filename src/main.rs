use homeroom::{AppState, config::Config, db};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("homeroom=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let db_pool = db::connect(&config.database_url).await?;
    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("database ready at {}", config.database_url);

    let app = homeroom::router(AppState::new(db_pool));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on port {}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
