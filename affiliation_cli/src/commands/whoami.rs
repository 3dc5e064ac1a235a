use anyhow::Result;
use affiliation_lib::date_range::APP_TIMEZONE;
use affiliation_lib::{SessionManager, SessionState};
use chrono::DateTime;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::output::{print_json, OutputFormat};

#[derive(Tabled, Serialize)]
struct WhoamiRow {
    #[tabled(rename = "User ID")]
    #[serde(rename = "User ID")]
    user_id: String,
    #[tabled(rename = "Email")]
    #[serde(rename = "Email")]
    email: String,
    #[tabled(rename = "Token Expires")]
    #[serde(rename = "Token Expires")]
    expires: String,
}

pub fn run(sessions: &SessionManager, format: &OutputFormat) -> Result<()> {
    let context = sessions.context();
    let session = match context.session() {
        Some(session) => session,
        None => {
            if matches!(context.state(), SessionState::Authenticated(_)) {
                eprintln!("Session expired. Run `affiliation login` to sign in again.");
            } else {
                eprintln!("Not logged in.");
            }
            return Ok(());
        }
    };

    let expires = session
        .expires_at_epoch_ms()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| {
            t.with_timezone(&APP_TIMEZONE)
                .format("%b %-d, %Y %H:%M %Z")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string());

    let row = WhoamiRow {
        user_id: session.user_id,
        email: session.email.unwrap_or_default(),
        expires,
    };
    match format {
        OutputFormat::Json => print_json(&row),
        _ => println!("{}", Table::new(vec![row])),
    }
    Ok(())
}
