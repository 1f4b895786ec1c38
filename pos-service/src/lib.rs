pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{NoopNotifier, Notifier, PosRepository, SettlementService, WhatsappNotifier};

#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub repository: PosRepository,
    pub settlement: SettlementService,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: mongodb::Database,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret()).await?;
        client_options.app_name = Some("pos-service".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database.db_name);

        services::init_metrics();

        let repository = PosRepository::new(&db);
        repository.init_indexes().await?;

        let whatsapp = WhatsappNotifier::new(config.whatsapp.clone());
        let notifier: Arc<dyn Notifier> = if whatsapp.is_configured() {
            tracing::info!("WhatsApp notifier initialized");
            Arc::new(whatsapp)
        } else {
            tracing::warn!("WhatsApp credentials not configured - invoice notifications disabled");
            Arc::new(NoopNotifier)
        };

        let settlement =
            SettlementService::new(repository.clone(), notifier, config.business.clone());

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            repository,
            settlement,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics))
            // Invoices and settlement
            .route(
                "/invoices",
                post(handlers::invoices::create_invoice)
                    .get(handlers::invoices::list_invoices)
                    .delete(handlers::invoices::bulk_delete_invoices),
            )
            .route("/invoices/due", get(handlers::invoices::customer_due))
            .route(
                "/invoices/by-customer/search",
                get(handlers::invoices::search_customer_invoices),
            )
            .route("/invoices/owner-stats", get(handlers::invoices::owner_stats))
            .route(
                "/invoices/owner-stats/reset",
                post(handlers::invoices::reset_owner_stats),
            )
            .route("/invoices/hard-reset", post(handlers::invoices::hard_reset))
            .route("/invoices/:id", get(handlers::invoices::get_invoice))
            .route(
                "/invoices/:id/status",
                patch(handlers::invoices::update_invoice_status),
            )
            // Customers and balances
            .route(
                "/customers",
                get(handlers::customers::list_customers).post(handlers::customers::upsert_customer),
            )
            .route(
                "/customers/pending",
                get(handlers::customers::pending_customers),
            )
            .route("/customers/:id", delete(handlers::customers::delete_customer))
            .route(
                "/customers/:id/amount",
                patch(handlers::customers::settle_amount),
            )
            // Transaction log
            .route(
                "/transactions",
                get(handlers::transactions::list_transactions),
            )
            .route(
                "/transactions/delete-all",
                post(handlers::transactions::delete_all_transactions),
            )
            // Product catalog
            .route(
                "/products",
                get(handlers::products::list_products).post(handlers::products::create_product),
            )
            .route(
                "/products/:id",
                patch(handlers::products::update_product)
                    .delete(handlers::products::delete_product),
            )
            .route("/products/:id/add-stock", post(handlers::products::add_stock))
            .layer(from_fn(metrics_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .layer(from_fn(request_id_middleware))
            .with_state(state);

        // Port 0 binds a random free port for tests.
        let address = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &mongodb::Database {
        &self.db
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
