use crate::{
    database::store::{OnDemandStore, TransactionalStore},
    Error,
};
use async_trait::async_trait;
use futures::lock::Mutex;
use sqlx::{Pool, Postgres, Transaction};
use std::sync::Arc;

#[derive(Debug)]
pub struct PgOnDemandStore {
    pub(crate) pool: Arc<Pool<Postgres>>,
}

impl PgOnDemandStore {
    pub(crate) fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }
}

impl OnDemandStore for PgOnDemandStore {}

pub struct PgTransactionalStore {
    pub(crate) txn: Arc<Mutex<Transaction<'static, Postgres>>>,
}

impl PgTransactionalStore {
    pub(crate) fn new(txn: Arc<Mutex<Transaction<'static, Postgres>>>) -> Self {
        Self { txn }
    }

    fn into_transaction(self) -> Result<Transaction<'static, Postgres>, Error> {
        let lock = Arc::try_unwrap(self.txn)
            .map_err(|_| anyhow::anyhow!("failed to unwrap transaction arc: still shared"))?;
        Ok(lock.into_inner())
    }
}

#[async_trait]
impl TransactionalStore for PgTransactionalStore {
    async fn commit(self) -> Result<(), Error> {
        self.into_transaction()?.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.into_transaction()?.rollback().await?;
        Ok(())
    }
}
