use donations_storage::sqlx::client::PgDatabaseClient;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;

pub struct PgContainer {
    pub client: PgDatabaseClient,

    // Owns container instance because when container is dropped, the
    // container is stopped.
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
}

// Starts a postgres instance via docker, connects and runs migrations.
pub async fn setup_pg_container() -> Result<PgContainer, anyhow::Error> {
    let container = Postgres::default().start().await?;
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;

    let postgres_uri = format!(
        "postgres://postgres:postgres@{}:{}/postgres?sslmode=disable",
        host, port
    );

    let client = PgDatabaseClient::connect(&postgres_uri, 5).await?;
    client.run_migrations().await?;

    Ok(PgContainer { client, container })
}
