use crate::credentials::WorkFactor;
use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("CREDSTORE_HASH_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32).range(8..)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2id time cost (number of passes)")
                .env("CREDSTORE_HASH_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2id degree of parallelism")
                .env("CREDSTORE_HASH_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32).range(1..=255)),
        )
}

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub work_factor: WorkFactor,
}

impl Options {
    /// Read the Argon2 work factor from parsed arguments.
    ///
    /// # Errors
    /// Returns an error if a value is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let get = |name: &str| {
            matches
                .get_one::<u32>(name)
                .copied()
                .with_context(|| format!("missing required argument: --{name}"))
        };

        Ok(Self {
            work_factor: WorkFactor {
                memory_kib: get(ARG_HASH_MEMORY_KIB)?,
                iterations: get(ARG_HASH_ITERATIONS)?,
                parallelism: get(ARG_HASH_PARALLELISM)?,
            },
        })
    }
}
