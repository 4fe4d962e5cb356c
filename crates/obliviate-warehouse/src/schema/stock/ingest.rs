use super::financials::fetch_financials;
use super::history::fetch_history;
use super::StockRecord;
use crate::api::Http;
use crate::store::Store;
use anyhow::{bail, Result};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio_stream::{self as stream, StreamExt};
use tracing::{debug, error, info, trace, warn};

/// What to refresh for a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Financials & history; creates or replaces the record.
    All,
    /// History only; updates an existing record.
    History,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::History => "history",
        }
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "history" => Ok(Self::History),
            other => bail!("unknown action {other:?}, expected \"all\" or \"history\""),
        }
    }
}

/// Outcome of one symbol; `code()` gives the numeric status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Processed = 0,
    Skipped = 1,
}

impl Status {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Already stored, and existing records are to be skipped.
    Existing,
    /// Not stored, so there is nothing to update.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    RefreshHistory,
    /// `replace` when a stored record is to be deleted first.
    RefreshAll { replace: bool },
}

/// Skip or refresh? Depends only on the arguments; nothing is fetched or stored.
pub fn decide(
    action: Action,
    symbol: &str,
    skip_existing: bool,
    known: &HashSet<String>,
) -> Decision {
    let is_known = known.contains(symbol);
    match action {
        Action::History if !is_known => Decision::Skip(SkipReason::Unknown),
        Action::History => Decision::RefreshHistory,
        Action::All if is_known && skip_existing => Decision::Skip(SkipReason::Existing),
        Action::All => Decision::RefreshAll { replace: is_known },
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Ingestion
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Owns the call layer & the store for one run.
pub struct Ingestor<H, S> {
    http: H,
    store: S,
    api_key: String,
}

impl<H: Http, S: Store> Ingestor<H, S> {
    pub fn new(http: H, store: S, api_key: &str) -> Self {
        Self {
            http,
            store,
            api_key: api_key.to_string(),
        }
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Refresh one symbol, as decided by [`decide`].
    pub async fn ingest(
        &self,
        action: Action,
        symbol: &str,
        skip_existing: bool,
        known: &HashSet<String>,
    ) -> Result<Status> {
        match decide(action, symbol, skip_existing, known) {
            Decision::Skip(reason) => {
                trace!("[{symbol}] skipped: {reason:?}");
                Ok(Status::Skipped)
            }
            Decision::RefreshHistory => self.refresh_history(symbol).await,
            Decision::RefreshAll { replace } => self.refresh_all(symbol, replace).await,
        }
    }

    async fn refresh_history(&self, symbol: &str) -> Result<Status> {
        let Some(mut record) = self.store.find(symbol).await? else {
            warn!("[{symbol}] listed as known, but not stored");
            return Ok(Status::Skipped);
        };

        let history = fetch_history(&self.http, symbol, &self.api_key).await;
        history.apply_to(&mut record);
        self.store.update(&record).await?;

        debug!("[{symbol}] history updated");
        Ok(Status::Processed)
    }

    async fn refresh_all(&self, symbol: &str, replace: bool) -> Result<Status> {
        let financial = fetch_financials(&self.http, symbol, &self.api_key).await;
        if financial.is_empty() {
            warn!("[{symbol}] no data from any endpoint");
            return Ok(Status::Skipped);
        }
        // stored under the provider's symbol, so it must be the one that was decided on
        if financial.symbol != symbol {
            warn!("[{symbol}] provider answered for {}", financial.symbol);
            return Ok(Status::Skipped);
        }
        if financial.is_etf() {
            debug!("[{symbol}] is an ETF");
            return Ok(Status::Skipped);
        }

        let history = fetch_history(&self.http, symbol, &self.api_key).await;
        let record = StockRecord::new(financial, history);

        if replace {
            self.store.remove(symbol).await?;
        }
        self.store.insert(&record).await?;

        debug!("[{symbol}] stored");
        Ok(Status::Processed)
    }

    /// Refresh every symbol in turn. A failing symbol is logged & counted, and the batch
    /// carries on; `tick` is called once per symbol.
    pub async fn run_batch(
        &self,
        action: Action,
        symbols: &[String],
        skip_existing: bool,
        known: &HashSet<String>,
        mut tick: impl FnMut(),
    ) -> BatchSummary {
        let start = Instant::now();
        let mut summary = BatchSummary::default();

        let mut stream = stream::iter(symbols);
        while let Some(symbol) = stream.next().await {
            summary.total += 1;
            match self.ingest(action, symbol, skip_existing, known).await {
                Ok(Status::Processed) => summary.processed += 1,
                Ok(Status::Skipped) => summary.skipped += 1,
                Err(e) => {
                    error!("[{symbol}] failed: {e}");
                    summary.failed += 1;
                }
            }
            tick();
        }

        summary.elapsed = start.elapsed();
        summary
    }
}

/// Counts of one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn log_summary(&self, action: Action) {
        info!(
            action = action.name(),
            total = self.total,
            processed = self.processed,
            skipped = self.skipped,
            failed = self.failed,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "batch complete"
        );
    }
}
