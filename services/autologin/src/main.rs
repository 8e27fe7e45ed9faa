use std::net::SocketAddr;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use tracing::{error, info};

use passlink_autologin::config::AutologinConfig;
use passlink_autologin::router::build_router;
use passlink_autologin::state::AppState;
use passlink_autologin::usecase::sweep::SweepExpiredUseCase;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = AutologinConfig::from_env();

    // Bounded waits: a slow pool surfaces as StoreUnavailable instead of a
    // hung request.
    let mut db_opts = ConnectOptions::new(&config.database_url);
    db_opts
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5));
    let db = Database::connect(db_opts)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let state = AppState {
        db,
        redis,
        code_salt: config.code_salt,
        default_ttl_secs: config.default_ttl_secs,
    };

    // Lookups already treat expired codes as absent; the sweep just keeps the
    // table bounded.
    let sweeper = SweepExpiredUseCase {
        codes: state.code_store(),
    };
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.execute().await {
                error!(error = %e, "expiry sweep failed");
            }
        }
    });

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.autologin_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("autologin service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
