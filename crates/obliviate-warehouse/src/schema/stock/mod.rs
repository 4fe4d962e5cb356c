pub mod endpoints;
pub mod financials;
pub mod history;
pub mod index;
pub mod ingest;
pub mod merge;

use financials::FinancialRecord;
use history::HistoryRecord;
use serde::{Deserialize, Serialize};

/// Everything stored for one symbol: the formatted financials & the daily series, side by
/// side in one flat document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(flatten)]
    pub financial: FinancialRecord,
    #[serde(flatten)]
    pub history: HistoryRecord,
}

impl StockRecord {
    pub fn new(financial: FinancialRecord, history: HistoryRecord) -> Self {
        Self { financial, history }
    }

    pub fn symbol(&self) -> &str {
        &self.financial.symbol
    }
}
