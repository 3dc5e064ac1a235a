use anyhow::{bail, Result};
use clap::Args;
use affiliation_lib::{LoginOutcome, SessionManager};

use crate::store::SessionStore;

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "AFFILIATION_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: &LoginArgs, sessions: &SessionManager, store: &SessionStore) -> Result<()> {
    match sessions.login(&args.email, &args.password).await {
        LoginOutcome::Authenticated { session, .. } => {
            store.save(&session)?;
            eprintln!(
                "Logged in as {} (user {})",
                session.email.as_deref().unwrap_or(&args.email),
                session.user_id
            );
            Ok(())
        }
        LoginOutcome::Invalid(errors) => {
            for error in errors.iter() {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("invalid login details")
        }
        LoginOutcome::Rejected { message } => bail!("{}", message),
    }
}
