use super::endpoints::{indicator, price_history};
use super::StockRecord;
use crate::api::Http;
use crate::schema::common::{normalize_decimal, render_value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A technical indicator, fetched at one period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndicatorSpec {
    /// Provider's indicator type; also the key of the value in each row.
    pub kind: &'static str,
    pub period: u32,
}

impl IndicatorSpec {
    /// e.g. `sma20`, `rsi14`
    pub fn key(&self) -> String {
        format!("{}{}", self.kind, self.period)
    }
}

pub const INDICATORS: [IndicatorSpec; 6] = [
    IndicatorSpec { kind: "sma", period: 20 },
    IndicatorSpec { kind: "sma", period: 50 },
    IndicatorSpec { kind: "sma", period: 100 },
    IndicatorSpec { kind: "sma", period: 200 },
    IndicatorSpec { kind: "williams", period: 14 },
    IndicatorSpec { kind: "rsi", period: 14 },
];

const SEPARATOR: char = ',';

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
////////////////////////////////////////////////////////////////////////////////////////////////////

// Input: daily prices, newest first
//
// {
//      "symbol": "AAPL",
//      "historical": [
//          {
//              "date": "2024-01-05",
//              "open": 181.99,
//              "high": 182.76,
//              "low": 180.17,
//              "close": 181.18,
//              "adjClose": 180.95,
//              "volume": 62379661,
//              "change": -0.81,
//              "changePercent": -0.44508,
//              "vwap": 181.37,
//              "label": "January 05, 24",
//              "changeOverTime": -0.0044508
//          },
//          ...
//      ]
// }
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PriceHistory {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub historical: Vec<PriceCell>,
}

// Values are kept as given; the provider sends numbers, but also text with decimal commas.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCell {
    #[serde(default)]
    pub date: String,
    pub open: Option<Value>,
    pub high: Option<Value>,
    pub low: Option<Value>,
    pub close: Option<Value>,
    pub adj_close: Option<Value>,
    pub volume: Option<Value>,
    pub change: Option<Value>,
    pub change_percent: Option<Value>,
    pub vwap: Option<Value>,
    pub label: Option<Value>,
    pub change_over_time: Option<Value>,
}

// Input: one indicator, newest first
//
// [
//      { "date": "2024-01-05 00:00:00", "open": 181.99, ..., "sma": 190.12 },
//      ...
// ]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IndicatorCell {
    pub date: String,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

// Output: one delimited string per field, oldest first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRecord {
    #[serde(rename = "HistoryDate")]
    pub history_date: String,
    #[serde(rename = "Open")]
    pub open: String,
    #[serde(rename = "High")]
    pub high: String,
    #[serde(rename = "Low")]
    pub low: String,
    #[serde(rename = "Close")]
    pub close: String,
    #[serde(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "Change")]
    pub change: String,
    #[serde(rename = "ChangePercent")]
    pub change_percent: String,
    #[serde(rename = "Vwap")]
    pub vwap: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "ChangeOverTime")]
    pub change_over_time: String,
    #[serde(rename = "SMA20")]
    pub sma20: String,
    #[serde(rename = "SMA50")]
    pub sma50: String,
    #[serde(rename = "SMA100")]
    pub sma100: String,
    #[serde(rename = "SMA200")]
    pub sma200: String,
    #[serde(rename = "WPR")]
    pub wpr: String,
    #[serde(rename = "RSI")]
    pub rsi: String,
}

impl HistoryRecord {
    /// Field holding the series of an indicator, by its `{kind}{period}` key.
    pub fn indicator_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "sma20" => Some(&mut self.sma20),
            "sma50" => Some(&mut self.sma50),
            "sma100" => Some(&mut self.sma100),
            "sma200" => Some(&mut self.sma200),
            "williams14" => Some(&mut self.wpr),
            "rsi14" => Some(&mut self.rsi),
            _ => None,
        }
    }

    /// Replace the series of an existing record with these.
    pub fn apply_to(self, record: &mut StockRecord) {
        record.history = self;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Assembly
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Delimited string under construction; every push leaves a trailing separator.
///
/// `finish()` trims every trailing separator, so empty entries at the newest end are dropped
/// rather than left as a dangling `,`. Entries keep their positions from the oldest end.
#[derive(Default)]
struct Series(String);

impl Series {
    fn push(&mut self, value: &str) {
        self.0.push_str(value);
        self.0.push(SEPARATOR);
    }

    fn finish(mut self) -> String {
        let kept = self.0.trim_end_matches(SEPARATOR).len();
        self.0.truncate(kept);
        self.0
    }
}

fn quoted(text: &str) -> String {
    format!("\"{text}\"")
}

fn number(value: Option<&Value>) -> String {
    normalize_decimal(&render_value(value))
}

/// Zip prices & indicators, all given in the provider's newest-first order, into series
/// that read oldest first.
///
/// Indicator values are lined up against the price dates; a date an indicator has no value
/// for gives an empty entry, and empty entries at the newest end are trimmed. Without
/// prices, an indicator keeps its own dates.
pub fn build_history(
    mut prices: Vec<PriceCell>,
    indicators: Vec<(IndicatorSpec, Vec<IndicatorCell>)>,
) -> HistoryRecord {
    prices.reverse();

    let mut dates = Series::default();
    let mut open = Series::default();
    let mut high = Series::default();
    let mut low = Series::default();
    let mut close = Series::default();
    let mut volume = Series::default();
    let mut change = Series::default();
    let mut change_percent = Series::default();
    let mut vwap = Series::default();
    let mut label = Series::default();
    let mut change_over_time = Series::default();

    for cell in &prices {
        dates.push(&quoted(&cell.date));
        open.push(&number(cell.open.as_ref()));
        high.push(&number(cell.high.as_ref()));
        low.push(&number(cell.low.as_ref()));
        close.push(&number(cell.adj_close.as_ref()));
        volume.push(&number(cell.volume.as_ref()));
        change.push(&number(cell.change.as_ref()));
        change_percent.push(&number(cell.change_percent.as_ref()));
        vwap.push(&number(cell.vwap.as_ref()));
        label.push(&quoted(&render_value(cell.label.as_ref())));
        change_over_time.push(&number(cell.change_over_time.as_ref()));
    }

    let mut record = HistoryRecord {
        history_date: dates.finish(),
        open: open.finish(),
        high: high.finish(),
        low: low.finish(),
        close: close.finish(),
        volume: volume.finish(),
        change: change.finish(),
        change_percent: change_percent.finish(),
        vwap: vwap.finish(),
        label: label.finish(),
        change_over_time: change_over_time.finish(),
        ..Default::default()
    };

    for (spec, mut cells) in indicators {
        cells.reverse();
        let value = |cell: &IndicatorCell| number(cell.values.get(spec.kind));

        let mut series = Series::default();
        if prices.is_empty() {
            for cell in &cells {
                series.push(&value(cell));
            }
        } else {
            // indicator rows may carry a time after the date
            let by_date: HashMap<&str, String> = cells
                .iter()
                .map(|cell| (day(&cell.date), value(cell)))
                .collect();
            for price in &prices {
                let entry = by_date.get(day(&price.date)).map(String::as_str);
                series.push(entry.unwrap_or_default());
            }
        }

        if let Some(field) = record.indicator_mut(&spec.key()) {
            *field = series.finish();
        }
    }

    record
}

// "2024-01-05 00:00:00" -> "2024-01-05"
fn day(date: &str) -> &str {
    date.split_whitespace().next().unwrap_or(date)
}

/// Fetch the price history & every indicator of `symbol`, and assemble the series.
///
/// A failed indicator is left out; a failed price history leaves the price series empty.
pub async fn fetch_history<H: Http>(http: &H, symbol: &str, api_key: &str) -> HistoryRecord {
    let prices = match http
        .fetch_de::<PriceHistory>(&price_history(symbol, api_key))
        .await
    {
        Some(history) => history.historical,
        None => {
            warn!("[{symbol}] no price history");
            vec![]
        }
    };
    debug!("[{symbol}] {} daily prices", prices.len());

    let mut indicators = Vec::with_capacity(INDICATORS.len());
    for spec in INDICATORS {
        let path = indicator(symbol, spec.kind, spec.period, api_key);
        match http.fetch_de::<Vec<IndicatorCell>>(&path).await {
            Some(cells) => indicators.push((spec, cells)),
            None => debug!("[{symbol}] {} skipped", spec.key()),
        }
    }

    build_history(prices, indicators)
}
