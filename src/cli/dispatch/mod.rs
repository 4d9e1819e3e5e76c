//! Map validated CLI arguments to an [`Action`].

use crate::cli::actions::{
    Action,
    server::{Args, Backend},
};
use crate::cli::commands::{ARG_DSN, ARG_IN_MEMORY, ARG_MAX_CONNECTIONS, ARG_PORT, hashing};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let backend = if matches.get_flag(ARG_IN_MEMORY) {
        Backend::Memory
    } else {
        let dsn = matches
            .get_one::<String>(ARG_DSN)
            .cloned()
            .context("missing required argument: --dsn")?;
        let max_connections = matches
            .get_one::<u32>(ARG_MAX_CONNECTIONS)
            .copied()
            .unwrap_or(5);

        Backend::Postgres {
            dsn,
            max_connections,
        }
    };

    let hashing = hashing::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        backend,
        work_factor: hashing.work_factor,
    }))
}
