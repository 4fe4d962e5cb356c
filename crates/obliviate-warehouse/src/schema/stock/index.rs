use super::endpoints::stock_list;
use crate::api::Http;
use serde::Deserialize;
use tracing::{debug, error};

// Input: every listed symbol
//
// [
//      {
//          "symbol": "AAPL",
//          "name": "Apple Inc.",
//          "price": 185.64,
//          "exchange": "NASDAQ Global Select",
//          "exchangeShortName": "NASDAQ",
//          "type": "stock"
//      },
//      ...
// ]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub exchange: Option<String>,
    pub exchange_short_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Sorted, de-duplicated symbols from a listing.
pub fn symbols(listings: Vec<Listing>) -> Vec<String> {
    let mut symbols: Vec<String> = listings
        .into_iter()
        .map(|listing| listing.symbol.trim().to_string())
        .filter(|symbol| !symbol.is_empty())
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

/// The provider's symbol universe; empty if the listing cannot be fetched.
pub async fn fetch_universe<H: Http>(http: &H, api_key: &str) -> Vec<String> {
    match http.fetch_de::<Vec<Listing>>(&stock_list(api_key)).await {
        Some(listings) => {
            let symbols = symbols(listings);
            debug!("{} symbols listed", symbols.len());
            symbols
        }
        None => {
            error!("failed to fetch the symbol universe");
            vec![]
        }
    }
}
