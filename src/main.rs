use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyhub::{ai, config, db, state::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = config::load_database_path();
    let pool = db::init_db(&db_path).expect("Failed to initialize database");

    let ai_config = config::load_ai_config();
    let service = ai::AiService::from_config(&ai_config);
    tracing::info!("AI provider chain: {:?}", service.provider_names());

    let app = studyhub::app(AppState::new(pool, Arc::new(service)));

    let bind_addr = config::server_bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

    tracing::info!("Server running on http://localhost:{}", config::server_port());

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
