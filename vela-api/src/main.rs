use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vela_api::gateways::{ChainGateway, WorkspaceGateway};
use vela_api::{app, AppState};
use vela_core::gateway::PendingPaymentOracle;
use vela_faucet::{ClaimService, FaucetConfig};
use vela_order::{OrderReconciler, OrderService, PricingConfig, ReconcilerConfig};
use vela_store::{Config, DbClient, PgOrderStore, PgQuotaLedger};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vela_api=debug,vela_order=debug,vela_faucet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Vela API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let order_store = Arc::new(PgOrderStore::new(db.pool.clone()));
    let ledger_store = Arc::new(PgQuotaLedger::new(db.pool.clone()));

    let oracle = Arc::new(PendingPaymentOracle);
    let provisioner = Arc::new(WorkspaceGateway::new(&config.provisioner));
    let chain = Arc::new(ChainGateway::new(&config.chain));

    let gateway_timeout = Duration::from_secs(config.reconciler.gateway_timeout_seconds);
    let reconciler = Arc::new(OrderReconciler::new(
        order_store.clone(),
        oracle,
        provisioner,
        ReconcilerConfig {
            interval: Duration::from_secs(config.reconciler.interval_seconds),
            payment_window: config
                .reconciler
                .payment_window_hours
                .map(chrono::Duration::hours),
            gateway_timeout,
        },
    ));
    reconciler.spawn();

    let pricing = PricingConfig {
        cpu_core_hour: config.pricing.cpu_core_hour,
        ram_gb_hour: config.pricing.ram_gb_hour,
        storage_gb_hour: config.pricing.storage_gb_hour,
    };
    let state = AppState {
        orders: Arc::new(OrderService::new(order_store, pricing)),
        faucet: Arc::new(ClaimService::new(
            ledger_store,
            chain,
            FaucetConfig {
                hourly_quota: config.faucet.hourly_quota,
                per_account_quota: config.faucet.per_account_quota,
                gateway_timeout,
            },
        )),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state)).await.unwrap();
}
