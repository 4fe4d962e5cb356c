use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, global = true, value_enum, default_value_t = TraceLevel::Info)]
    pub trace: TraceLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, merge & store records, one symbol at a time.
    Ingest {
        action: ActionArg,

        /// Symbols to ingest, comma-separated; defaults to the provider's universe for
        /// `all`, and to the stored symbols for `history`.
        #[arg(long, value_delimiter = ',', value_parser = parse_symbol)]
        symbols: Vec<String>,

        /// Replace records that are already stored.
        #[arg(long)]
        overwrite: bool,

        /// Keep everything in memory; nothing is written.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the provider's symbol universe.
    Symbols,

    /// Print the stored record of a symbol.
    Show { symbol: String },

    /// Clean up directories of the file store.
    Rm { directories: Vec<RmArgs> },
}

// records are stored under the provider's upper-case symbols
fn parse_symbol(s: &str) -> Result<String, String> {
    let symbol = s.trim().to_uppercase();
    if symbol.is_empty() {
        return Err("empty symbol".to_string());
    }
    Ok(symbol)
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionArg {
    /// Financials & history; creates or replaces records.
    All,
    /// History only; updates stored records.
    History,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum RmArgs {
    /// Remove the store directory; one `.json` per symbol.
    Store,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
