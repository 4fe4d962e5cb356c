use anyhow::Result;
use clap::Parser;
use cli::{ActionArg, Cli, Commands::*, RmArgs, TraceLevel};
use dotenv::dotenv;
use obliviate_util::ui::single_pb;
use obliviate_warehouse::schema::stock::index::fetch_universe;
use obliviate_warehouse::{Action, Config, FileStore, FmpClient, Ingestor, MemoryStore, Store};
use std::collections::HashSet;
use tracing::{debug, info, subscriber, trace, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;

fn preprocess(trace_level: Level) {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::All => Action::All,
            ActionArg::History => Action::History,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::Trace => Level::TRACE,
        TraceLevel::Debug => Level::DEBUG,
        TraceLevel::Info => Level::INFO,
        TraceLevel::Warn => Level::WARN,
        TraceLevel::Error => Level::ERROR,
    };

    preprocess(log_level);
    trace!("Command line input recorded: {cli:#?}");

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> obliviate <COMMAND>"
    match &cli.command {
        // "> obliviate ingest [all history] --symbols AAPL,MSFT --overwrite --dry-run"
        // refresh records, one symbol at a time
        Ingest {
            action,
            symbols,
            overwrite,
            dry_run,
        } => {
            // missing key or URL stops here, before any call
            let config = Config::from_env()?;
            debug!("Store directory: {}", config.store_dir.display());

            let action = Action::from(*action);
            let http = FmpClient::from_config(&config)?;
            let files = FileStore::new(&config.store_dir);
            let known: HashSet<String> = files.symbols().await?.into_iter().collect();
            debug!("{} symbols already stored", known.len());

            let symbols = match (symbols.is_empty(), action) {
                (false, _) => symbols.clone(),
                (true, Action::All) => fetch_universe(&http, &config.api_key).await,
                (true, Action::History) => files.symbols().await?,
            };
            info!("Ingesting {} symbols: {}", symbols.len(), action.name());

            if *dry_run {
                info!("Dry run; nothing will be written");
                let ingestor = Ingestor::new(http, MemoryStore::new(), &config.api_key);
                ingest(&ingestor, action, &symbols, !*overwrite, &known).await;
                let records = ingestor.store().records().await;
                for (symbol, record) in records {
                    debug!("[{symbol}] {}", serde_json::to_string(&record)?);
                }
            } else {
                let ingestor = Ingestor::new(http, files, &config.api_key);
                ingest(&ingestor, action, &symbols, !*overwrite, &known).await;
            }
        }

        // ---------------------------------------------------------------------------
        // "> obliviate symbols"
        // list the provider's symbol universe
        Symbols => {
            let config = Config::from_env()?;
            let http = FmpClient::from_config(&config)?;
            for symbol in fetch_universe(&http, &config.api_key).await {
                println!("{symbol}");
            }
        }

        // ---------------------------------------------------------------------------
        // "> obliviate show AAPL"
        // print a stored record
        Show { symbol } => {
            let files = FileStore::new(Config::store_dir_from_env());
            match files.find(&symbol.to_uppercase()).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => warn!("[{symbol}] not stored"),
            }
        }

        // "> obliviate rm [store]"
        // remove directories
        Rm { directories } => {
            if directories.contains(&RmArgs::Store) {
                let store_dir = Config::store_dir_from_env();
                trace!("Removing directory: {}", store_dir.display());
                tokio::fs::remove_dir_all(&store_dir).await?;
            }

            debug!("Removed directories: {directories:#?}");
        }
    }

    Ok(())
}

async fn ingest<S: Store>(
    ingestor: &Ingestor<FmpClient, S>,
    action: Action,
    symbols: &[String],
    skip_existing: bool,
    known: &HashSet<String>,
) {
    let pb = single_pb(symbols.len() as u64);
    let summary = ingestor
        .run_batch(action, symbols, skip_existing, known, || pb.inc(1))
        .await;
    pb.finish_and_clear();
    summary.log_summary(action);
}
