use crate::services::donation::CreateDonationRequest;
use chrono::{DateTime, Utc};
use donations_storage::models::donation::DonationRow;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// JSON shape of a persisted donation.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    pub donor_name: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl From<&DonationRow> for Donation {
    fn from(row: &DonationRow) -> Self {
        Self {
            id: row.id,
            donor_name: row.donor_name.clone(),
            amount: row.amount,
            date: row.date,
        }
    }
}

/// Body of `POST /donations`. Missing fields fall back to empty/zero values
/// and are rejected by validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateDonationBody {
    pub donor_name: Option<String>,
    #[serde(deserialize_with = "number_only")]
    pub amount: Option<Decimal>,
    pub date: Option<String>,
}

// Only JSON numbers are amounts; `"10"` is a type error.
fn number_only<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Number>::deserialize(deserializer)? {
        Some(number) => number,
        None => return Ok(None),
    };
    let amount = match (number.as_i64(), number.as_f64()) {
        (Some(i), _) => Some(Decimal::from(i)),
        (None, Some(f)) => Decimal::from_f64(f),
        (None, None) => None,
    };
    amount
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("amount {} is out of range", number)))
}

impl From<CreateDonationBody> for CreateDonationRequest {
    fn from(body: CreateDonationBody) -> Self {
        Self {
            donor_name: body.donor_name.unwrap_or_default(),
            amount: body.amount.unwrap_or_default(),
            date: body.date,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationResponse {
    pub donation: Donation,

    // Null when the CRM could not be notified.
    pub crm_result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_error: Option<String>,
}
