use anyhow::Result;
use affiliation_lib::SessionManager;

use crate::store::SessionStore;

pub fn run(sessions: &SessionManager, store: &SessionStore) -> Result<()> {
    sessions.sign_out();
    store.clear()?;
    eprintln!("Signed out.");
    Ok(())
}
