use crate::schema::stock::StockRecord;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use obliviate_util::{read_json, write_json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Where are the records **loaded**?
///
/// Records are keyed by symbol. Implementations must be safe to share across tasks.
#[async_trait]
pub trait Store: Send + Sync {
    /// The stored record of `symbol`, if any.
    async fn find(&self, symbol: &str) -> Result<Option<StockRecord>>;

    /// Store `record` under its symbol, replacing whatever was there.
    async fn insert(&self, record: &StockRecord) -> Result<()>;

    /// Delete the record of `symbol`; deleting a missing record is not an error.
    async fn remove(&self, symbol: &str) -> Result<()>;

    /// Replace an existing record; fails if there is none to replace.
    async fn update(&self, record: &StockRecord) -> Result<()>;

    /// Every stored symbol, sorted.
    async fn symbols(&self) -> Result<Vec<String>>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// In-memory
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Keeps records in memory; used for dry runs & tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, StockRecord>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inserts, updates & removals so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of everything stored.
    pub async fn records(&self) -> BTreeMap<String, StockRecord> {
        self.records.lock().await.clone()
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, symbol: &str) -> Result<Option<StockRecord>> {
        Ok(self.records.lock().await.get(symbol).cloned())
    }

    async fn insert(&self, record: &StockRecord) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(record.symbol().to_string(), record.clone());
        self.wrote();
        Ok(())
    }

    async fn remove(&self, symbol: &str) -> Result<()> {
        self.records.lock().await.remove(symbol);
        self.wrote();
        Ok(())
    }

    async fn update(&self, record: &StockRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        let slot = records
            .get_mut(record.symbol())
            .ok_or_else(|| anyhow!("no record to update for {}", record.symbol()))?;
        *slot = record.clone();
        self.wrote();
        Ok(())
    }

    async fn symbols(&self) -> Result<Vec<String>> {
        Ok(self.records.lock().await.keys().cloned().collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Files
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One `.json` document per symbol, under one directory:
///
/// ```text
/// ./buffer/stocks/AAPL.json
/// ./buffer/stocks/MSFT.json
/// ...
/// ```
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, symbol: &str) -> Result<PathBuf> {
        if symbol.is_empty() || symbol.contains(['/', '\\']) || symbol.starts_with('.') {
            bail!("invalid symbol for a file name: {symbol:?}");
        }
        Ok(self.dir.join(format!("{symbol}.json")))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn find(&self, symbol: &str) -> Result<Option<StockRecord>> {
        let path = self.path(symbol)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let record = read_json(&path).await?;
        Ok(Some(record))
    }

    async fn insert(&self, record: &StockRecord) -> Result<()> {
        let path = self.path(record.symbol())?;
        write_json(&path, record).await?;
        trace!("[{}] stored at {}", record.symbol(), path.display());
        Ok(())
    }

    async fn remove(&self, symbol: &str) -> Result<()> {
        let path = self.path(symbol)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("[{symbol}] removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, record: &StockRecord) -> Result<()> {
        let path = self.path(record.symbol())?;
        if !tokio::fs::try_exists(&path).await? {
            bail!("no record to update for {}", record.symbol());
        }
        write_json(&path, record).await
    }

    async fn symbols(&self) -> Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(vec![]);
        }

        let mut symbols = vec![];
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }
        symbols.sort();

        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stock::financials::FinancialRecord;

    fn record(symbol: &str, revenue: &str) -> StockRecord {
        StockRecord {
            financial: FinancialRecord {
                symbol: symbol.to_string(),
                revenue: revenue.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn memory_store_round() {
        let store = MemoryStore::new();

        store.insert(&record("MSFT", "1")).await.expect("insert");
        store.insert(&record("AAPL", "2")).await.expect("insert");
        store.insert(&record("AAPL", "3")).await.expect("upsert");

        let found = store.find("AAPL").await.expect("find").expect("record");
        assert_eq!(found.financial.revenue, "3");
        assert_eq!(store.symbols().await.expect("symbols"), vec!["AAPL", "MSFT"]);

        store.remove("MSFT").await.expect("remove");
        store.remove("MSFT").await.expect("remove twice");
        assert!(store.find("MSFT").await.expect("find").is_none());
        assert_eq!(store.writes(), 5);
    }

    #[tokio::test]
    async fn memory_store_update_needs_a_record() {
        let store = MemoryStore::new();
        assert!(store.update(&record("NEW", "1")).await.is_err());
        assert_eq!(store.writes(), 0);

        store.insert(&record("NEW", "1")).await.expect("insert");
        store.update(&record("NEW", "2")).await.expect("update");
        assert_eq!(store.records().await["NEW"].financial.revenue, "2");
    }

    #[tokio::test]
    async fn file_store_round() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("stocks"));

        // nothing written yet
        assert!(store.symbols().await.expect("symbols").is_empty());
        assert!(store.find("AAPL").await.expect("find").is_none());

        store.insert(&record("MSFT", "1")).await.expect("insert");
        store.insert(&record("AAPL", "2")).await.expect("insert");
        assert!(store.dir().join("AAPL.json").exists());
        assert_eq!(store.symbols().await.expect("symbols"), vec!["AAPL", "MSFT"]);

        store.update(&record("AAPL", "3")).await.expect("update");
        let found = store.find("AAPL").await.expect("find").expect("record");
        assert_eq!(found, record("AAPL", "3"));

        store.remove("AAPL").await.expect("remove");
        store.remove("AAPL").await.expect("remove twice");
        assert_eq!(store.symbols().await.expect("symbols"), vec!["MSFT"]);
    }

    #[tokio::test]
    async fn file_store_update_needs_a_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert!(store.update(&record("NEW", "1")).await.is_err());
        assert!(!dir.path().join("NEW.json").exists());
    }

    #[tokio::test]
    async fn file_store_ignores_other_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), "x").expect("write");
        let store = FileStore::new(dir.path());
        store.insert(&record("BRK.B", "1")).await.expect("insert");

        assert_eq!(store.symbols().await.expect("symbols"), vec!["BRK.B"]);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_symbols() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert!(store.insert(&record("../AAPL", "1")).await.is_err());
        assert!(store.find("").await.is_err());
    }
}
