use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct DonationRow {
    pub id: i64,
    pub donor_name: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewDonationRow {
    pub donor_name: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}
