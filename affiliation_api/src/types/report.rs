use serde::{Deserialize, Serialize};

use super::DataType;

/// One purchase made through an affiliation code.
///
/// Monetary amounts arrive as decimal strings and are kept verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SalesRecord {
    pub id: String,
    pub customer_id: String,
    pub purchase_amount: String,
    pub purchase_quantity: String,
    pub vat_percentage: String,
    pub vat_amount: String,
    pub amount_with_vat: String,
    pub service_charge_percentage: String,
    pub service_charge_amount: String,
    pub subtotal_amount: String,
    pub total_discounted_amount: String,
    pub service_charge_amount_after_discount: String,
    pub paid_amount: String,
    pub amount_before_settlement: String,
    pub buy_type: String,
    pub pgw_transaction_id: Option<String>,
    pub pgw_settlement_fee_percentage: String,
    pub pgw_settlement_fee_amount: String,
    pub vat_percentage_on_service_charge: String,
    pub vat_amount_on_service_charge: String,
    pub collectable_service_charge_amount: String,
    pub business_receivable_amount: String,
    pub offer_id: Option<String>,
    pub residue_amount: Option<String>,
    pub payer_no: Option<String>,
    pub market_price: String,
    pub pay_channel: String,
    pub payment_gateway: String,
    pub user_transaction_ref: String,
    pub checkpoint: String,
    pub transacted_at: String,
    pub updated_at: String,
    pub pgw_tracking_id: String,
    pub status: String,
    pub customer_name: String,
    pub customer_joining_date: String,
    pub customer_phone: String,
    pub customer_nid_no: Option<String>,
}

/// One user who signed up through an affiliation code.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegistrationRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub affiliation_partner_reference_id: String,
    pub source_affiliation_code: String,
}

/// A detail-report row. The variant is chosen by the requested [`DataType`],
/// never by inspecting which fields are present.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ReportRow {
    Sales(SalesRecord),
    Registration(RegistrationRecord),
}

impl ReportRow {
    /// Decodes one raw row as the shape `data_type` promises.
    pub fn from_value(
        data_type: DataType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match data_type {
            DataType::Sales => ReportRow::Sales(serde_json::from_value(value)?),
            DataType::Registration => ReportRow::Registration(serde_json::from_value(value)?),
        })
    }
}
