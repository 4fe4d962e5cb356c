use async_trait::async_trait;
use obliviate_warehouse::schema::stock::endpoints::{financial_endpoints, indicator, price_history};
use obliviate_warehouse::schema::stock::index::fetch_universe;
use obliviate_warehouse::{Action, FileStore, Http, Ingestor, MemoryStore, Status, Store};
use serde_json::json;
use std::collections::{HashMap, HashSet};

const KEY: &str = "test-key";

/// Serves bodies by path; every other call fails.
struct Canned(HashMap<String, String>);

#[async_trait]
impl Http for Canned {
    async fn get(&self, path: &str) -> Option<String> {
        self.0.get(path).cloned()
    }
}

fn provider() -> Canned {
    let mut bodies = HashMap::new();
    let requests = financial_endpoints("AAPL", KEY);
    let body = |category: &str| -> Option<String> {
        let body = match category {
            "esg" => json!([
                {"ESGScore": "61,2"}, {"ESGScore": 60.1}, {"ESGScore": 59.9}, {"ESGScore": 58.3},
                {"ESGScore": 57.0}
            ]),
            "income-statement" => json!([
                {"date": "2023-09-30", "calendarYear": "2023", "revenue": 383285000000_i64, "eps": 6.13},
                {"date": "2022-09-24", "calendarYear": "2022", "revenue": 394328000000_i64, "eps": 6.15}
            ]),
            "ratios" => json!([
                {"date": "2023-09-30", "currentRatio": "0,988"},
                {"date": "2022-09-24", "currentRatio": 0.879}
            ]),
            "profile" => json!([{
                "symbol": "AAPL",
                "companyName": "Apple Inc.",
                "city": "Cupertino",
                "isEtf": false,
                "price": 185.64
            }]),
            "stock-peers" => json!([{"symbol": "AAPL", "peersList": ["MSFT", "GOOGL"]}]),
            _ => return None,
        };
        Some(body.to_string())
    };
    for request in requests {
        if let Some(body) = body(request.category.name()) {
            bodies.insert(request.path, body);
        }
    }

    bodies.insert(
        price_history("AAPL", KEY),
        json!({
            "symbol": "AAPL",
            "historical": [
                {"date": "2024-01-03", "open": 184.22, "adjClose": 184.02, "label": "January 03, 24"},
                {"date": "2024-01-02", "open": 187.15, "adjClose": 185.4, "label": "January 02, 24"}
            ]
        })
        .to_string(),
    );
    bodies.insert(
        indicator("AAPL", "sma", 20, KEY),
        json!([
            {"date": "2024-01-03 00:00:00", "sma": 192.3},
            {"date": "2024-01-02 00:00:00", "sma": 192.9}
        ])
        .to_string(),
    );
    bodies.insert(
        "v3/stock/list?apikey=test-key".to_string(),
        json!([
            {"symbol": "AAPL", "name": "Apple Inc.", "price": 185.64, "exchange": "NASDAQ",
             "exchangeShortName": "NASDAQ", "type": "stock"}
        ])
        .to_string(),
    );

    Canned(bodies)
}

#[tokio::test]
async fn full_refresh_lands_one_record() {
    let ingestor = Ingestor::new(provider(), MemoryStore::new(), KEY);

    let status = ingestor
        .ingest(Action::All, "AAPL", true, &HashSet::new())
        .await
        .expect("ingest");
    assert_eq!(status, Status::Processed);

    let record = ingestor
        .store()
        .find("AAPL")
        .await
        .expect("find")
        .expect("record");
    let doc = serde_json::to_value(&record).expect("document");

    // singles
    assert_eq!(doc["Symbol"], "AAPL");
    assert_eq!(doc["CompanyName"], "Apple Inc.");
    assert_eq!(doc["City"], "Cupertino");
    assert_eq!(doc["PeersList"], "MSFT,GOOGL");
    // accumulated, newest first
    assert_eq!(doc["CalendarYear"], "2023, 2022");
    assert_eq!(doc["Revenue"], "383285000000, 394328000000");
    assert_eq!(doc["CurrentRatio"], "0.988, 0.879");
    // quarterly scores kept at 0 & 4
    assert_eq!(doc["ESGScore"], "61.2, 57.0");
    // series, oldest first
    assert_eq!(doc["HistoryDate"], r#""2024-01-02","2024-01-03""#);
    assert_eq!(doc["Open"], "187.15,184.22");
    assert_eq!(doc["Close"], "185.4,184.02");
    assert_eq!(doc["Label"], r#""January 02, 24","January 03, 24""#);
    assert_eq!(doc["SMA20"], "192.9,192.3");
    assert_eq!(doc["RSI"], "");
}

#[tokio::test]
async fn universe_then_history_through_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ingestor = Ingestor::new(provider(), FileStore::new(dir.path()), KEY);

    let universe = fetch_universe(ingestor.http(), KEY).await;
    assert_eq!(universe, vec!["AAPL"]);

    let known: HashSet<String> = ingestor
        .store()
        .symbols()
        .await
        .expect("symbols")
        .into_iter()
        .collect();
    let summary = ingestor
        .run_batch(Action::All, &universe, true, &known, || {})
        .await;
    assert_eq!(summary.processed, 1);

    // second pass: the record exists now
    let known: HashSet<String> = ingestor
        .store()
        .symbols()
        .await
        .expect("symbols")
        .into_iter()
        .collect();
    let summary = ingestor
        .run_batch(Action::All, &universe, true, &known, || {})
        .await;
    assert_eq!(summary.skipped, 1);

    let summary = ingestor
        .run_batch(Action::History, &universe, true, &known, || {})
        .await;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);

    let record = ingestor
        .store()
        .find("AAPL")
        .await
        .expect("find")
        .expect("record");
    assert_eq!(record.financial.company_name, "Apple Inc.");
    assert_eq!(record.history.close, "185.4,184.02");
}
