use crate::crm::{self, Acknowledgment, CrmClient};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use donations_status::Status;
use donations_storage::{
    database::{
        client::DatabaseClient,
        store::{OnDemandStore, TransactionalStore},
    },
    models::donation::{DonationRow, NewDonationRow},
    stores::donation::DonationStore,
};
use log::{debug, error, info};
use rust_decimal::Decimal;
use std::{marker::PhantomData, sync::Arc};


pub const DONOR_NAME_REQUIRED: &str = "DonorName is required";
pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be > 0";
pub const DATE_INVALID: &str = "Date must be an ISO-8601 timestamp";

// 0001-01-01T00:00:00Z, the zero value clients send for "no date".
const UNSET_DATE_SECS: i64 = -62_135_596_800;

// Accepted shapes for timestamps without a zone, read as UTC.
const UNZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateDonationRequest {
    pub donor_name: String,
    pub amount: Decimal,
    pub date: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreatedDonation {
    pub donation: DonationRow,
    pub crm_result: Acknowledgment,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // Caller input violates a constraint. The message is shown to the caller.
    #[error("{0}")]
    Validation(String),

    #[error("storage failed: {0}")]
    Storage(#[from] donations_storage::Error),
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        match error {
            Error::Validation(message) => Status::invalid_argument(message),
            Error::Storage(e) => {
                error!("{:?}", e);
                e.into()
            }
        }
    }
}

/// Failure of `create_donation`. Only `NotStored` has an error status; a
/// `Notifier` failure still carries the persisted donation.
#[derive(thiserror::Error, Debug)]
pub enum CreateError {
    #[error(transparent)]
    NotStored(#[from] Error),

    #[error("crm notification failed for donation {id}: {source}", id = .donation.id)]
    Notifier {
        donation: DonationRow,
        source: crm::Error,
    },
}

#[async_trait]
pub trait DonationService: Send + Sync {
    /// Validates and stores a donation, then notifies the CRM of it.
    async fn create_donation(
        &self,
        request: CreateDonationRequest,
    ) -> Result<CreatedDonation, CreateError>;

    /// All donations, most recent first.
    async fn list_donations(&self) -> Result<Vec<DonationRow>, Error>;
}

pub struct DonationServiceImpl<Client, Store, TStore>
where
    Client: DatabaseClient<Store, TStore>,
    Store: DonationStore + OnDemandStore,
    TStore: DonationStore + TransactionalStore,
{
    database: Arc<Client>,
    crm: Arc<dyn CrmClient>,
    _marker: PhantomData<fn() -> (Store, TStore)>,
}

impl<Client, Store, TStore> DonationServiceImpl<Client, Store, TStore>
where
    Client: DatabaseClient<Store, TStore> + 'static,
    Store: DonationStore + OnDemandStore + 'static,
    TStore: DonationStore + TransactionalStore + 'static,
{
    pub fn new(client: Arc<Client>, crm: Arc<dyn CrmClient>) -> Self {
        Self {
            database: client,
            crm,
            _marker: PhantomData,
        }
    }

    // The write runs on its own task: once started it completes and commits
    // even if the request that triggered it goes away.
    async fn persist(&self, new_row: NewDonationRow) -> Result<DonationRow, Error> {
        let database = self.database.clone();
        let row = tokio::spawn(async move {
            let txn = database.begin().await?;
            let row = txn.add_donation(new_row).await?;
            txn.commit().await?;
            Ok::<_, donations_storage::Error>(row)
        })
        .await
        .map_err(|e| {
            donations_storage::Error::Other(anyhow::anyhow!("store task failed: {:?}", e))
        })??;
        Ok(row)
    }
}

#[async_trait]
impl<Client, Store, TStore> DonationService for DonationServiceImpl<Client, Store, TStore>
where
    Client: DatabaseClient<Store, TStore> + 'static,
    Store: DonationStore + OnDemandStore + 'static,
    TStore: DonationStore + TransactionalStore + 'static,
{
    async fn create_donation(
        &self,
        request: CreateDonationRequest,
    ) -> Result<CreatedDonation, CreateError> {
        let new_row = validate(request, Utc::now()).map_err(|e| {
            debug!("rejected donation: {}", e);
            e
        })?;

        let donation = self.persist(new_row).await?;
        info!("stored donation {}", donation.id);

        match self.crm.send_donation(&donation).await {
            Ok(crm_result) => Ok(CreatedDonation {
                donation,
                crm_result,
            }),
            Err(source) => {
                error!(
                    "crm notification failed for donation {}: {:?}",
                    donation.id, source
                );
                Err(CreateError::Notifier { donation, source })
            }
        }
    }

    async fn list_donations(&self) -> Result<Vec<DonationRow>, Error> {
        Ok(self.database.on_demand().list_donations().await?)
    }
}

/// Checks the request, in order: donor name, amount, date. Returns the row
/// to insert with a trimmed name and a UTC date (`now` when none was given).
pub fn validate(
    request: CreateDonationRequest,
    now: DateTime<Utc>,
) -> Result<NewDonationRow, Error> {
    let donor_name = request.donor_name.trim();
    if donor_name.is_empty() {
        return Err(Error::Validation(DONOR_NAME_REQUIRED.to_string()));
    }
    if request.amount <= Decimal::ZERO {
        return Err(Error::Validation(AMOUNT_NOT_POSITIVE.to_string()));
    }

    let date = match request.date.as_deref().map(str::trim) {
        None | Some("") => now,
        Some(raw) => {
            let date =
                parse_timestamp(raw).ok_or_else(|| Error::Validation(DATE_INVALID.to_string()))?;
            if is_unset(&date) {
                now
            } else {
                date
            }
        }
    };

    Ok(NewDonationRow {
        donor_name: donor_name.to_string(),
        amount: request.amount,
        date,
    })
}

/// Parses an ISO-8601 timestamp. Zoned input is converted to the same
/// instant in UTC; unzoned input keeps its fields and is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.with_timezone(&Utc));
    }
    UNZONED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn is_unset(date: &DateTime<Utc>) -> bool {
    date.timestamp() == UNSET_DATE_SECS && date.timestamp_subsec_nanos() == 0
}
