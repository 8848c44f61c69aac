use crate::{
    models::donation::*,
    sqlx::store::{PgOnDemandStore, PgTransactionalStore},
    Error,
};
use async_trait::async_trait;
use sqlx::PgExecutor;

#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Inserts a donation, returning it with the id assigned by the database.
    async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error>;

    /// Lists every donation, most recent `date` first. Donations sharing a
    /// `date` are ordered newest id first.
    async fn list_donations(&self) -> Result<Vec<DonationRow>, Error>;
}

#[async_trait]
impl DonationStore for PgOnDemandStore {
    async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error> {
        Ok(add_donation(&*self.pool, new_row).await?)
    }

    async fn list_donations(&self) -> Result<Vec<DonationRow>, Error> {
        Ok(list_donations(&*self.pool).await?)
    }
}

#[async_trait]
impl DonationStore for PgTransactionalStore {
    async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error> {
        let mut lock = self.txn.lock().await;
        Ok(add_donation(&mut **lock, new_row).await?)
    }

    async fn list_donations(&self) -> Result<Vec<DonationRow>, Error> {
        let mut lock = self.txn.lock().await;
        Ok(list_donations(&mut **lock).await?)
    }
}

async fn add_donation<'a, E>(executor: E, new_row: NewDonationRow) -> Result<DonationRow, Error>
where
    E: PgExecutor<'a>,
{
    Ok(sqlx::query_as(
        r#"
        INSERT INTO donations (donor_name, amount, date)
        VALUES ($1, $2, $3)
        RETURNING id, donor_name, amount, date"#,
    )
    .bind(&new_row.donor_name)
    .bind(new_row.amount)
    .bind(new_row.date)
    .fetch_one(executor)
    .await?)
}

async fn list_donations<'a, E>(executor: E) -> Result<Vec<DonationRow>, Error>
where
    E: PgExecutor<'a>,
{
    Ok(sqlx::query_as(
        "SELECT id, donor_name, amount, date \
        FROM donations \
        ORDER BY date DESC, id DESC",
    )
    .fetch_all(executor)
    .await?)
}
