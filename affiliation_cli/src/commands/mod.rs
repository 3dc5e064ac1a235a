//! CLI subcommand implementations.

pub mod login;
pub mod logout;
pub mod reports;
pub mod whoami;
