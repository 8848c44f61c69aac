use donations_status::Status;
use ::sqlx::migrate::MigrateError;

pub mod database {
    pub mod client;
    pub mod store;
}

pub mod models {
    pub mod donation;
}

pub mod sqlx {
    pub mod client;
    pub mod store;
}

pub mod stores {
    pub mod donation;
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // Error occurred when executing some SQL operation.
    #[error("sql failed: {0:?}")]
    Sql(#[from] ::sqlx::Error),

    // Error occurred when running migrations.
    #[error("migration failed: {0:?}")]
    Migrate(#[from] MigrateError),

    // Some other/unexpected error occurred.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Callers only ever see a generic message; the cause stays in the server log.
impl From<Error> for Status {
    fn from(_: Error) -> Self {
        Status::internal("internal error")
    }
}
