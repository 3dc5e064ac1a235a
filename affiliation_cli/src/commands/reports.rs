use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;
use affiliation_lib::date_range::{today_in_app_zone, REPORT_MAX_DAYS};
use affiliation_lib::validation::{
    validate_data_type, validate_date, validate_page, validate_page_size, validate_report_form,
};
use affiliation_lib::{
    ActiveQuery, DateRangePicker, DateRangeSelection, DisableRules, FilterStore, ReportClient,
    ReportDashboard, ReportForm,
};

use crate::output::{print_report_rows, print_summary_rows, OutputFormat};

#[derive(Args)]
pub struct ReportsArgs {
    /// Affiliation code to report on
    #[arg(long)]
    pub code: Option<String>,

    /// Range start (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Range end (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Dataset: sales or registration
    #[arg(long = "type", default_value = "sales")]
    pub data_type: String,

    /// Show the per-day summary instead of detail rows
    #[arg(long)]
    pub summary: bool,

    /// Page number
    #[arg(long)]
    pub page: Option<i64>,

    /// Results per page
    #[arg(long)]
    pub page_size: Option<i64>,

    /// Restore filters from a dashboard URL or query string
    #[arg(long, conflicts_with_all = ["code", "from", "to", "summary"])]
    pub url: Option<String>,
}

pub async fn run(args: &ReportsArgs, client: Arc<ReportClient>, format: &OutputFormat) -> Result<()> {
    let mut filters = match &args.url {
        Some(url) => {
            let query = url.split_once('?').map(|(_, q)| q).unwrap_or(url);
            FilterStore::from_query_string(query)
        }
        None => {
            let form = build_form(args)?;
            let validated = match validate_report_form(&form, today_in_app_zone()) {
                Ok(validated) => validated,
                Err(errors) => {
                    for error in errors.iter() {
                        eprintln!("{}: {}", error.field, error.message);
                    }
                    bail!("invalid report filters");
                }
            };
            let mut filters = FilterStore::new();
            filters.submit(validated);
            filters
        }
    };

    if let Some(page_size) = args.page_size {
        filters.set_page_size(validate_page_size(page_size)?);
    }
    if let Some(page) = args.page {
        filters.set_page(validate_page(page)?);
    }

    if !filters.has_active_filter() {
        eprintln!("No filters given; pass --code or a --url with filters.");
        return Ok(());
    }
    if filters.active_query() == ActiveQuery::Idle {
        eprintln!("Filters need a data type plus a code or a complete date range.");
        return Ok(());
    }
    tracing::debug!("filters: ?{}", filters.query_string());

    let summary = filters.criteria().summary;
    let mut dashboard = ReportDashboard::new(client, filters);
    dashboard.refresh().await;

    if let Some(error) = dashboard.error() {
        bail!("{}", error);
    }
    if let Some(message) = dashboard.empty_state_message() {
        eprintln!("{}", message);
        return Ok(());
    }

    if summary {
        if let Some(resp) = dashboard.summary().data() {
            print_summary_rows(&resp.data, format)?;
        }
    } else if let Some(resp) = dashboard.detail().data() {
        print_report_rows(&resp.data, format)?;
    }

    if let Some(info) = dashboard.page_info() {
        eprintln!(
            "Page {}/{} ({} total records, {} per page)",
            info.current_page, info.last_page, info.total, info.page_size
        );
    }

    Ok(())
}

/// Collects the flags into a form, running the dates through the range picker
/// so an over-long range is shortened the same way a click-selection is.
fn build_form(args: &ReportsArgs) -> Result<ReportForm> {
    let from = args.from.as_deref().map(validate_date).transpose()?;
    let to = args.to.as_deref().map(validate_date).transpose()?;
    let (from_date, to_date) = picked_range(from, to);

    Ok(ReportForm {
        input_value: args.code.clone().unwrap_or_default(),
        from_date,
        to_date,
        summary: args.summary,
        data_type: Some(validate_data_type(&args.data_type)?),
    })
}

fn picked_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let (Some(_), Some(requested_to)) = (from, to) else {
        return (from, to);
    };

    let mut picker = DateRangePicker::new(DisableRules {
        future_allowed: false,
        max_days: Some(REPORT_MAX_DAYS),
        ..DisableRules::default()
    });
    picker.open();
    picker.select(DateRangeSelection::new(from, to));
    match picker.apply() {
        Some(applied) => {
            if applied.end_date() != requested_to {
                eprintln!(
                    "Range shortened to {} ({} days max)",
                    picker.label(""),
                    REPORT_MAX_DAYS
                );
            }
            (Some(applied.start_date()), Some(applied.end_date()))
        }
        None => (from, to),
    }
}
