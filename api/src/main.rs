use std::sync::Arc;

use actix_web::{web, HttpServer};
use chrono::Utc;
use dotenv::dotenv;
use log::{info, warn};

use kw_api::app::create_app;
use kw_api::config::Config;
use kw_api::routes::AppState;
use kw_core::repositories::{TokenRepository, UserRepository};
use kw_core::services::{
    AuthService, KeyRotationEngine, KeyRotationScheduler, TokenCleanupService, TokenService,
};
use kw_infra::{
    DatabasePool, InMemoryTokenRepository, InMemoryUserRepository, MySqlTokenRepository,
    MySqlUserRepository,
};
use kw_shared::config::StorageBackend;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env();
    env_logger::init_from_env(
        env_logger::Env::new().default_filter_or(config.app.logging.level.as_str()),
    );

    info!(
        "Starting Keyward API Server ({}, storage: {:?})",
        config.app.environment,
        config.storage()
    );

    // Key generation is CPU bound; keep it off the async workers.
    let keys = Arc::new(KeyRotationEngine::with_file_store(config.key_rotation()));
    let material = {
        let keys = Arc::clone(&keys);
        tokio::task::spawn_blocking(move || keys.init(Utc::now())).await??
    };
    info!("Key material ready, valid until {}", material.expires_at());

    match config.storage() {
        StorageBackend::Mysql => {
            let pool = DatabasePool::new(config.app.database.clone()).await?;
            pool.run_migrations().await?;
            let users = Arc::new(MySqlUserRepository::new(pool.get_pool().clone()));
            let tokens = Arc::new(MySqlTokenRepository::new(pool.get_pool().clone()));
            let result = serve(&config, Arc::clone(&keys), users, tokens).await;
            pool.close().await;
            result
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; users and tokens are lost on restart");
            let users = Arc::new(InMemoryUserRepository::new());
            let tokens = Arc::new(InMemoryTokenRepository::new());
            serve(&config, Arc::clone(&keys), users, tokens).await
        }
    }?;

    keys.shutdown();
    info!("Keyward API Server stopped");
    Ok(())
}

async fn serve<U, T>(
    config: &Config,
    keys: Arc<KeyRotationEngine>,
    users: Arc<U>,
    tokens: Arc<T>,
) -> anyhow::Result<()>
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    let token_service = Arc::new(TokenService::new(
        Arc::clone(&tokens),
        Arc::clone(&users),
        Arc::clone(&keys),
        config.token_service(),
    ));
    let auth_service = Arc::new(AuthService::new(users, token_service, config.auth_service()));

    let rotation_task = Arc::new(KeyRotationScheduler::new(Arc::clone(&keys))).start_background_task();
    let cleanup_task =
        Arc::new(TokenCleanupService::new(tokens, config.token_cleanup())).start_background_task();

    let app_state = web::Data::new(AppState::new(auth_service, keys));
    let cors = config.app.cors.clone();
    let environment = config.app.environment;

    let bind_address = config.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(app_state.clone(), &cors, environment));
    if config.app.server.workers > 0 {
        server = server.workers(config.app.server.workers);
    }
    server.bind(&bind_address)?.run().await?;

    rotation_task.abort();
    if let Some(task) = cleanup_task {
        task.abort();
    }
    Ok(())
}
