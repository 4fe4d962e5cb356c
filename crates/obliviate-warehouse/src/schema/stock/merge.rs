use super::endpoints::{Category, Request};
use crate::api::Http;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// One reporting period, with the fields of every endpoint merged into it.
///
/// Rank 0 is the most recent period; each rank above it is one period older.
pub type Rank = Map<String, Value>;

/// The rows one endpoint returned for one symbol.
#[derive(Clone, Debug)]
pub struct Payload {
    pub category: Category,
    pub rows: Vec<Rank>,
}

/// ESG scores are reported quarterly; keep one in four (indices 0, 4, 8, ...) so that they
/// line up with the annual statements.
pub fn downsample_esg(rows: Vec<Rank>) -> Vec<Rank> {
    rows.into_iter().step_by(4).collect()
}

/// Call every endpoint in `requests`, one at a time and in order, keeping the payloads of
/// those that answered with an array of objects.
pub async fn collect_payloads<H: Http>(
    http: &H,
    symbol: &str,
    requests: &[Request],
) -> Vec<Payload> {
    let mut payloads = Vec::with_capacity(requests.len());

    for request in requests {
        let category = request.category;
        let rows = match http.fetch_de::<Vec<Rank>>(&request.path).await {
            Some(rows) => rows,
            None => {
                debug!("[{symbol}] {} contributed nothing", category.name());
                continue;
            }
        };

        let rows = match category {
            Category::Esg => downsample_esg(rows),
            _ => rows,
        };
        trace!("[{symbol}] {} returned {} rows", category.name(), rows.len());
        payloads.push(Payload { category, rows });
    }

    payloads
}

/// Multi-period payloads that stop short of the longest one; their older periods will be
/// missing from the merged ranks. Single-period payloads (profile, rating, ...) are expected
/// to cover rank 0 only and are not listed.
pub fn short_payloads(payloads: &[Payload]) -> Vec<&'static str> {
    let longest = payloads.iter().map(|p| p.rows.len()).max().unwrap_or(0);
    payloads
        .iter()
        .filter(|p| p.rows.len() > 1 && p.rows.len() < longest)
        .map(|p| p.category.name())
        .collect()
}

/// Merge the payloads into ranks, by array position.
///
/// Row *i* of every payload is merged into rank *i*, in payload order; on a field name
/// collision the later payload's value replaces the earlier one. A payload shorter than
/// the others simply stops contributing past its own length.
pub fn merge_ranks(payloads: Vec<Payload>) -> Vec<Rank> {
    let short = short_payloads(&payloads);
    if !short.is_empty() {
        warn!("periods misaligned; shorter payloads: {short:?}");
    }

    let mut ranks: BTreeMap<usize, Rank> = BTreeMap::new();
    for payload in payloads {
        for (i, row) in payload.rows.into_iter().enumerate() {
            ranks.entry(i).or_default().extend(row);
        }
    }

    ranks.into_values().collect()
}
