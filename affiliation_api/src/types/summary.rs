use serde::{Deserialize, Serialize};

use super::DataType;

/// Sales aggregated per day.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SalesSummary {
    pub created_date: String,
    pub total_sales: i64,
    pub total_customers: i64,
    pub purchase_amount: String,
    pub service_charge_amount: String,
    pub paid_amount: String,
    pub auto_pay_extra_amount: Option<String>,
    pub vat_amount: String,
    pub pgw_settlement_fee_amount: String,
    pub business_receivable_amount: String,
}

/// Registrations aggregated per day.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegistrationSummary {
    pub created_date: String,
    pub total_users: i64,
}

/// A summary-report row, keyed by the requested [`DataType`].
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SummaryRow {
    Sales(SalesSummary),
    Registration(RegistrationSummary),
}

impl SummaryRow {
    /// Decodes one raw row as the shape `data_type` promises.
    pub fn from_value(
        data_type: DataType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match data_type {
            DataType::Sales => SummaryRow::Sales(serde_json::from_value(value)?),
            DataType::Registration => SummaryRow::Registration(serde_json::from_value(value)?),
        })
    }

    pub fn created_date(&self) -> &str {
        match self {
            SummaryRow::Sales(s) => &s.created_date,
            SummaryRow::Registration(r) => &r.created_date,
        }
    }
}
