use donations_storage::{
    database::{
        client::DatabaseClient,
        store::{OnDemandStore, TransactionalStore},
    },
    models::donation::*,
    stores::donation::*,
    Error,
};
use async_trait::async_trait;
use mockall::mock;

mock! {
  pub DatabaseClient {}

  #[async_trait]
  impl DatabaseClient<MockStore, MockStore> for DatabaseClient {
      fn on_demand(&self) -> MockStore;

      async fn begin(&self) -> Result<MockStore, Error>;
  }
}

mock! {
  pub Store {}

  #[async_trait]
  impl DonationStore for Store {
      async fn add_donation(&self, new_row: NewDonationRow) -> Result<DonationRow, Error>;

      async fn list_donations(&self) -> Result<Vec<DonationRow>, Error>;
  }

  impl OnDemandStore for Store {}

  #[async_trait]
  impl TransactionalStore for Store {
      async fn commit(self) -> Result<(), Error>;

      async fn rollback(self) -> Result<(), Error>;
  }
}
