use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_connect::{
    api,
    config::Settings,
    repository::{AnnouncementRepository, SqliteAnnouncementRepository},
    service::{AnnouncementService, ServiceContext, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_connect=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Campus Connect server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database when persistence is on
    let db_pool = if settings.database.enabled {
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.database.max_connections)
            .connect(&settings.database.url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await?;

        Some(pool)
    } else {
        tracing::info!("Database disabled, announcements are kept in memory only");
        None
    };

    let announcement_repo = db_pool.clone().map(|pool| {
        Arc::new(SqliteAnnouncementRepository::new(pool)) as Arc<dyn AnnouncementRepository>
    });

    let announcement_service = Arc::new(
        AnnouncementService::bootstrap(announcement_repo, settings.announcements.seed_demo_data).await?,
    );

    if settings.auth.admin_token.is_none() {
        tracing::warn!("No admin token configured; admin routes will reject every request");
    }

    let service_context = Arc::new(ServiceContext::new(
        announcement_service,
        Arc::new(SystemClock),
        db_pool,
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on {}", settings.server.base_url);

    axum::serve(listener, app).await?;

    Ok(())
}
