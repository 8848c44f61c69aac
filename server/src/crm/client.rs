use crate::{
    crm::{Acknowledgment, CrmClient, Error},
    wire::Donation,
};
use async_trait::async_trait;
use donations_storage::models::donation::DonationRow;
use log::debug;
use std::time::Duration;

/// Posts donations as JSON to a remote CRM endpoint.
pub struct HttpCrmClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpCrmClient {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn send_donation(&self, donation: &DonationRow) -> Result<Acknowledgment, Error> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&Donation::from(donation));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("crm responded to donation {}: {}", donation.id, status);

        if !status.is_success() {
            return Err(Error::Rejected { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
