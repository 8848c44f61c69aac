use donations_server::{
    api,
    config::{CrmConfig, ServerConfig},
    crm::{client::HttpCrmClient, stub::StubCrmClient, CrmClient},
    services::donation::{DonationService, DonationServiceImpl},
};
use donations_storage::sqlx::{
    client::PgDatabaseClient,
    store::{PgOnDemandStore, PgTransactionalStore},
};
use log::{error, info};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    info!("Loading config");
    let config = ServerConfig::from_env()?;

    // Database connection:
    info!("Connecting to database");
    let database = Arc::new(
        PgDatabaseClient::connect(&config.postgres.uri, config.postgres.max_connections).await?,
    );

    info!("Running migrations (if any)");
    database.run_migrations().await?;

    // Dependencies:
    let crm: Arc<dyn CrmClient> = match &config.crm {
        CrmConfig::Mock => Arc::new(StubCrmClient::new()),
        CrmConfig::Http(crm_config) => Arc::new(HttpCrmClient::new(
            crm_config.endpoint.clone(),
            crm_config.api_key.clone(),
            Duration::from_secs(crm_config.timeout_secs),
        )?),
    };

    // Services:
    let donation_service: Arc<dyn DonationService> = Arc::new(DonationServiceImpl::<
        PgDatabaseClient,
        PgOnDemandStore,
        PgTransactionalStore,
    >::new(database, crm));

    let app = api::app(donation_service, &config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server: {:?}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
