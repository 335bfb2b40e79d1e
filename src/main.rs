use std::sync::Arc;
use std::time::Duration;

use cositas::app::build_router;
use cositas::core::auth::{AdminSeed, AuthApiState, AuthService, SessionManager};
use cositas::core::config::Config;
use cositas::core::db::{ProductRepository, SessionRepository, UserRepository, connect};
use cositas::core::products::{ContactLink, ProductApiState};

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, addr={}, production={}, setup_endpoint={}, whatsapp={}",
        config.has_database(),
        config.site_addr,
        config.production,
        config.has_admin_seed(),
        config.has_whatsapp()
    );

    let pool = connect(&config).await?;

    let user_repo = UserRepository::new(pool.clone());
    if user_repo.count().await? == 0 {
        tracing::warn!(
            "No admin account exists yet; set ADMIN_SEED_PASSWORD and call /api/setup"
        );
    }

    let auth_service = AuthService::new(
        Arc::new(user_repo),
        Arc::new(SessionRepository::new(pool.clone())),
        config.session_config(),
    );

    spawn_session_cleanup(auth_service.sessions().clone());

    let admin_seed = config.admin_seed_password.clone().map(|password| AdminSeed {
        username: config.admin_username.clone(),
        password,
    });

    let app = build_router(
        AuthApiState {
            auth_service: auth_service.clone(),
            admin_seed,
        },
        ProductApiState {
            product_repo: ProductRepository::new(pool),
            auth_service,
            contact: config.whatsapp_phone.clone().map(ContactLink::new),
        },
        &config.site_root,
    );

    tracing::info!("listening on http://{}", config.site_addr);

    let listener = tokio::net::TcpListener::bind(config.site_addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn spawn_session_cleanup(sessions: SessionManager) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!("Removed {} expired sessions", removed),
                Err(e) => tracing::error!("Session cleanup failed: {}", e),
            }
        }
    });
}
