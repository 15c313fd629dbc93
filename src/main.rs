// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use quizhub::{
    config::Config,
    models::user::{NewUser, normalize_email},
    routes,
    state::AppState,
    store::{MemoryStore, PgStore, SharedStore},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store (data is not persisted)");
            Arc::new(MemoryStore::new())
        }
    };

    if let Err(e) = seed_admin_user(&store, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let port = config.port;
    let app = routes::create_router(AppState { store, config });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    axum::serve(listener, app).await.expect("Server error");
}

async fn connect_with_retry(url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

async fn seed_admin_user(
    store: &SharedStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let email = normalize_email(email);
        if store.find_user_by_email(&email).await?.is_none() {
            tracing::info!("Seeding admin user: {}", email);
            store
                .create_user(NewUser::seeded_admin(&email, password)?)
                .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
