pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use tsfile_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            series,
            data_type,
            seq,
            unseq,
            time_op,
            time_bound,
            value_lo,
            value_hi,
            batch_size,
            cache_capacity,
        } => handlers::handle_scan(
            series,
            data_type,
            seq,
            unseq,
            time_op,
            time_bound,
            value_lo,
            value_hi,
            batch_size,
            cache_capacity,
        ),
        Commands::Lookup {
            series,
            data_type,
            seq,
            at,
            cache_capacity,
        } => handlers::handle_lookup(series, data_type, seq, at, cache_capacity),
    }
}
