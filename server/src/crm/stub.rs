use crate::{
    crm::{Acknowledgment, CrmClient, Error},
    wire::Donation,
};
use async_trait::async_trait;
use donations_storage::models::donation::DonationRow;
use log::info;
use serde::Serialize;

pub const PROVIDER: &str = "MockCRM";

/// Stand-in CRM. Logs the donation and echoes it back with an "ok" status.
#[derive(Clone, Debug, Default)]
pub struct StubCrmClient;

impl StubCrmClient {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct StubAcknowledgment {
    provider: &'static str,
    status: &'static str,
    echo: Donation,
}

#[async_trait]
impl CrmClient for StubCrmClient {
    async fn send_donation(&self, donation: &DonationRow) -> Result<Acknowledgment, Error> {
        info!(
            "{} sent {} ({}, {} @ {})",
            PROVIDER, donation.id, donation.donor_name, donation.amount, donation.date
        );
        Ok(serde_json::to_value(StubAcknowledgment {
            provider: PROVIDER,
            status: "ok",
            echo: donation.into(),
        })?)
    }
}
