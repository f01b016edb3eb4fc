use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "tsfile read-path CLI (alpha)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DataTypeArg {
    Bool,
    I32,
    I64,
    F32,
    F64,
    Text,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum TimeOpArg {
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a series: merge every sequential and unsequential file given,
    /// in ascending timestamp order, and print each surviving point.
    Scan {
        /// fully qualified series path, e.g. root.group.device.sensor
        series: String,
        #[arg(value_enum)]
        data_type: DataTypeArg,

        /// closed sequential files backing this series, oldest-version first
        #[arg(long = "seq", value_delimiter = ',')]
        seq: Vec<PathBuf>,
        /// closed unsequential files backing this series, oldest-version first
        #[arg(long = "unseq", value_delimiter = ',')]
        unseq: Vec<PathBuf>,

        #[arg(long = "time-op", requires = "time_bound")]
        time_op: Option<TimeOpArg>,
        #[arg(long = "time-bound", requires = "time_op")]
        time_bound: Option<i64>,

        #[arg(long = "value-lo", requires = "value_hi")]
        value_lo: Option<f64>,
        #[arg(long = "value-hi", requires = "value_lo")]
        value_hi: Option<f64>,

        #[arg(long, default_value_t = 10_000)]
        batch_size: usize,
        #[arg(long, default_value_t = 128)]
        cache_capacity: usize,
    },

    /// Look up the value of a series at one timestamp, against the
    /// sequential files only.
    Lookup {
        series: String,
        #[arg(value_enum)]
        data_type: DataTypeArg,

        #[arg(long = "seq", value_delimiter = ',')]
        seq: Vec<PathBuf>,

        #[arg(long)]
        at: i64,

        #[arg(long, default_value_t = 128)]
        cache_capacity: usize,
    },
}
