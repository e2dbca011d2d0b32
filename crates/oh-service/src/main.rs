use oh_service::clock::MonotonicClock;
use oh_service::config::Config;
use oh_service::coordinator::Coordinator;
use oh_service::http::{build_router, OpsState};
use oh_service::identity::StaticRoster;
use oh_service::observability::metrics;
use oh_service::store::RedisStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first; the log filter default comes from it.
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(&config);

    info!("Starting Office Hours coordinator");

    let metrics_handle = metrics::init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    info!("Connecting to store...");
    let store = RedisStore::connect(&config.store.url).await.map_err(|e| {
        error!("Failed to connect to store: {}", e);
        e
    })?;
    let store = Arc::new(store);

    info!("Store connection established");

    let mut roster = StaticRoster::new();
    for admin in &config.admin_users {
        roster = roster.with_admin(admin.clone());
    }
    let coordinator = Coordinator::new(Arc::clone(&store), Arc::new(roster))
        .with_elevated_groups(config.elevated_groups.clone())
        .with_clock(Arc::new(MonotonicClock::default()));

    // Recovery hook: force the listed sessions inactive and clear their
    // queue/call state before serving.
    for owner in &config.bootstrap_owners {
        let affected = coordinator.bootstrap(owner).await.map_err(|e| {
            error!("Failed to bootstrap session {}: {}", owner, e);
            e
        })?;
        info!(owner = %owner, affected, "session bootstrapped at startup");
    }

    let state = OpsState {
        store,
        metrics: Some(metrics_handle),
    };
    let app = build_router(state);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Office Hours coordinator listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("oh_service={},tower_http=info", config.observability.log_level).into()
    });
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
