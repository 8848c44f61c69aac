use async_trait::async_trait;
use donations_storage::models::donation::DonationRow;

pub mod client;
pub mod stub;

/// Whatever the CRM answered. Forwarded to API callers untouched.
pub type Acknowledgment = serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request error: {0:?}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0:?}")]
    Json(#[from] serde_json::Error),

    #[error("crm rejected donation: status={status}, body={body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Notifies an external CRM of a persisted donation.
#[async_trait]
pub trait CrmClient: Send + Sync {
    async fn send_donation(&self, donation: &DonationRow) -> Result<Acknowledgment, Error>;
}
