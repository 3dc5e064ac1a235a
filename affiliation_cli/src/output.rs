use anyhow::Result;
use affiliation_lib::types::{
    RegistrationRecord, RegistrationSummary, ReportRow, SalesRecord, SalesSummary, SummaryRow,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> OutputFormat {
        match s {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct SalesReportRow {
    #[tabled(rename = "Sales Order ID")]
    #[serde(rename = "Sales Order ID")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "MSISDN")]
    #[serde(rename = "MSISDN")]
    msisdn: String,
    #[tabled(rename = "NID")]
    #[serde(rename = "NID")]
    nid: String,
    #[tabled(rename = "Joining Date")]
    #[serde(rename = "Joining Date")]
    joining_date: String,
    #[tabled(rename = "Principal Amount")]
    #[serde(rename = "Principal Amount")]
    principal: String,
    #[tabled(rename = "Sale Gold (Gm)")]
    #[serde(rename = "Sale Gold (Gm)")]
    gold_grams: String,
    #[tabled(rename = "VAT Amount (On Gold)")]
    #[serde(rename = "VAT Amount (On Gold)")]
    vat: String,
    #[tabled(rename = "Payment Before Settlement Fee")]
    #[serde(rename = "Payment Before Settlement Fee")]
    before_settlement: String,
}

#[derive(Tabled, Serialize)]
struct RegistrationReportRow {
    #[tabled(rename = "User ID")]
    #[serde(rename = "User ID")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    #[serde(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Partner Reference ID")]
    #[serde(rename = "Partner Reference ID")]
    partner_reference_id: String,
    #[tabled(rename = "Source Affiliation Code")]
    #[serde(rename = "Source Affiliation Code")]
    source_code: String,
}

#[derive(Tabled, Serialize)]
struct SalesSummaryRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Total Sales")]
    #[serde(rename = "Total Sales")]
    total_sales: i64,
    #[tabled(rename = "Total Customers")]
    #[serde(rename = "Total Customers")]
    total_customers: i64,
    #[tabled(rename = "Purchase Amount")]
    #[serde(rename = "Purchase Amount")]
    purchase_amount: String,
    #[tabled(rename = "Paid Amount")]
    #[serde(rename = "Paid Amount")]
    paid_amount: String,
    #[tabled(rename = "VAT Amount")]
    #[serde(rename = "VAT Amount")]
    vat_amount: String,
    #[tabled(rename = "Business Receivable")]
    #[serde(rename = "Business Receivable")]
    business_receivable: String,
}

#[derive(Tabled, Serialize)]
struct RegistrationSummaryRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Total Users")]
    #[serde(rename = "Total Users")]
    total_users: i64,
}

// -- Row builders --

fn build_sales_rows(records: &[&SalesRecord]) -> Vec<SalesReportRow> {
    records
        .iter()
        .map(|r| SalesReportRow {
            id: r.id.clone(),
            name: r.customer_name.clone(),
            msisdn: r.customer_phone.clone(),
            nid: r.customer_nid_no.clone().unwrap_or_else(|| "N/A".to_string()),
            joining_date: format_date(&r.customer_joining_date),
            principal: format_taka(&r.purchase_amount),
            gold_grams: r.purchase_quantity.clone(),
            vat: format_taka(&r.vat_amount),
            before_settlement: format_taka(&r.amount_before_settlement),
        })
        .collect()
}

fn build_registration_rows(records: &[&RegistrationRecord]) -> Vec<RegistrationReportRow> {
    records
        .iter()
        .map(|r| RegistrationReportRow {
            id: r.id.clone(),
            name: r.name.clone(),
            phone: r.phone.clone(),
            partner_reference_id: r.affiliation_partner_reference_id.clone(),
            source_code: r.source_affiliation_code.clone(),
        })
        .collect()
}

fn build_sales_summary_rows(rows: &[&SalesSummary]) -> Vec<SalesSummaryRow> {
    rows.iter()
        .map(|s| SalesSummaryRow {
            date: format_date(&s.created_date),
            total_sales: s.total_sales,
            total_customers: s.total_customers,
            purchase_amount: format_taka(&s.purchase_amount),
            paid_amount: format_taka(&s.paid_amount),
            vat_amount: format_taka(&s.vat_amount),
            business_receivable: format_taka(&s.business_receivable_amount),
        })
        .collect()
}

fn build_registration_summary_rows(rows: &[&RegistrationSummary]) -> Vec<RegistrationSummaryRow> {
    rows.iter()
        .map(|r| RegistrationSummaryRow {
            date: format_date(&r.created_date),
            total_users: r.total_users,
        })
        .collect()
}

// -- Rendering --

fn render<R: Tabled + Serialize>(rows: Vec<R>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

/// Prints detail rows. A page holds one data type, so only one table comes out.
pub fn print_report_rows(rows: &[ReportRow], format: &OutputFormat) -> Result<()> {
    let sales: Vec<&SalesRecord> = rows
        .iter()
        .filter_map(|r| match r {
            ReportRow::Sales(s) => Some(s),
            _ => None,
        })
        .collect();
    let registrations: Vec<&RegistrationRecord> = rows
        .iter()
        .filter_map(|r| match r {
            ReportRow::Registration(r) => Some(r),
            _ => None,
        })
        .collect();

    if !sales.is_empty() {
        render(build_sales_rows(&sales), format)?;
    }
    if !registrations.is_empty() {
        render(build_registration_rows(&registrations), format)?;
    }
    Ok(())
}

pub fn print_summary_rows(rows: &[SummaryRow], format: &OutputFormat) -> Result<()> {
    let sales: Vec<&SalesSummary> = rows
        .iter()
        .filter_map(|r| match r {
            SummaryRow::Sales(s) => Some(s),
            _ => None,
        })
        .collect();
    let registrations: Vec<&RegistrationSummary> = rows
        .iter()
        .filter_map(|r| match r {
            SummaryRow::Registration(r) => Some(r),
            _ => None,
        })
        .collect();

    if !sales.is_empty() {
        render(build_sales_summary_rows(&sales), format)?;
    }
    if !registrations.is_empty() {
        render(build_registration_summary_rows(&registrations), format)?;
    }
    Ok(())
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// `1500` -> `৳1500.00`. Unparseable amounts are shown as they came.
fn format_taka(amount: &str) -> String {
    match amount.trim().parse::<f64>() {
        Ok(value) => format!("৳{:.2}", value),
        Err(_) => amount.to_string(),
    }
}

/// `2023-11-02` or an ISO timestamp -> `Nov 2, 2023`.
fn format_date(raw: &str) -> String {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        });
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use affiliation_lib::types::DataType;

    fn load_rows(name: &str, data_type: DataType) -> Vec<ReportRow> {
        let json_str = std::fs::read_to_string(format!("../affiliation_api/tests/fixtures/{}", name))
            .unwrap();
        let resp: serde_json::Value = serde_json::from_str(&json_str).unwrap();
        resp["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| ReportRow::from_value(data_type, v.clone()).unwrap())
            .collect()
    }

    #[test]
    fn test_format_taka() {
        assert_eq!(format_taka("1500"), "৳1500.00");
        assert_eq!(format_taka("24.5"), "৳24.50");
        assert_eq!(format_taka("n/a"), "n/a");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2023-11-02"), "Nov 2, 2023");
        assert_eq!(format_date("2024-02-14T10:22:31+06:00"), "Feb 14, 2024");
        assert_eq!(format_date("2024-02-14T10:22:31"), "Feb 14, 2024");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_build_sales_rows_mapping() {
        let rows = load_rows("sales_reports.json", DataType::Sales);
        let sales: Vec<&SalesRecord> = rows
            .iter()
            .filter_map(|r| match r {
                ReportRow::Sales(s) => Some(s),
                _ => None,
            })
            .collect();
        let built = build_sales_rows(&sales);
        assert_eq!(built.len(), 1);

        let row = &built[0];
        assert_eq!(row.name, "Rahim Uddin");
        assert_eq!(row.msisdn, "01700000000");
        assert_eq!(row.nid, "N/A");
        assert_eq!(row.joining_date, "Nov 2, 2023");
        assert_eq!(row.principal, "৳1500.00");
        assert_eq!(row.before_settlement, "৳1605.00");
    }

    #[test]
    fn test_build_registration_rows_mapping() {
        let rows = load_rows("registration_reports.json", DataType::Registration);
        let regs: Vec<&RegistrationRecord> = rows
            .iter()
            .filter_map(|r| match r {
                ReportRow::Registration(r) => Some(r),
                _ => None,
            })
            .collect();
        let built = build_registration_rows(&regs);
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].name, "Karim Ahmed");
        assert_eq!(built[1].name, "Nusrat Jahan");
        assert_eq!(built[0].source_code, "AFF-01");
    }

    #[test]
    fn test_build_summary_rows() {
        let sales = SalesSummary {
            created_date: "2024-02-14".to_string(),
            total_sales: 12,
            total_customers: 9,
            purchase_amount: "18000.5".to_string(),
            service_charge_amount: "360".to_string(),
            paid_amount: "19260".to_string(),
            auto_pay_extra_amount: None,
            vat_amount: "900".to_string(),
            pgw_settlement_fee_amount: "288.9".to_string(),
            business_receivable_amount: "18677.6".to_string(),
        };
        let built = build_sales_summary_rows(&[&sales]);
        assert_eq!(built[0].date, "Feb 14, 2024");
        assert_eq!(built[0].purchase_amount, "৳18000.50");

        let reg = RegistrationSummary {
            created_date: "2024-02-13".to_string(),
            total_users: 4,
        };
        let built = build_registration_summary_rows(&[&reg]);
        assert_eq!(built[0].total_users, 4);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::parse("markdown"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Table);
    }

    #[test]
    fn test_csv_headers() {
        let reg = RegistrationSummary {
            created_date: "2024-02-13".to_string(),
            total_users: 4,
        };
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in build_registration_summary_rows(&[&reg]) {
            wtr.serialize(row).unwrap();
        }
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "Date,Total Users\n\"Feb 13, 2024\",4\n");
    }
}
