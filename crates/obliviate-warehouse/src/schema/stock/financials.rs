use super::endpoints::financial_endpoints;
use super::merge::{collect_payloads, merge_ranks, Rank};
use crate::api::Http;
use crate::schema::common::{normalize_decimal, render_value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Separator between the periods of an accumulated field.
pub const SEPARATOR: &str = ", ";

/// How a field behaves across ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Rank 0's value, never accumulated.
    Single,
    /// Every rank's value, newest first, joined by [`SEPARATOR`].
    Accumulate,
}

/// One row of the field mapping table.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    /// Name of the field in the stored record.
    pub name: &'static str,
    /// Name of the field in the provider's payloads.
    pub key: &'static str,
    pub policy: Policy,
    /// Convert decimal commas to dots.
    pub normalize: bool,
    pub accessor: fn(&mut FinancialRecord) -> &mut String,
}

impl FieldSpec {
    /// Read this field from a rank, as stored text.
    pub fn read(&self, rank: &Rank) -> String {
        let raw = render_value(rank.get(self.key));
        if self.normalize {
            normalize_decimal(&raw)
        } else {
            raw
        }
    }
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("policy", &self.policy)
            .field("normalize", &self.normalize)
            .finish()
    }
}

// normalisation flags
const NUM: bool = true;
const RAW: bool = false;

/// Declares the record struct & its mapping table from one list, so the two cannot drift.
macro_rules! financial_schema {
    ($($field:ident: $name:literal <- $key:literal, $policy:ident, $norm:ident;)*) => {
        /// The canonical financial record of one symbol.
        #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct FinancialRecord {
            $(
                #[serde(rename = $name)]
                pub $field: String,
            )*
        }

        /// Field name -> {provider key, merge policy, normalisation, accessor}.
        pub static SCHEMA: &[FieldSpec] = &[
            $(
                FieldSpec {
                    name: $name,
                    key: $key,
                    policy: Policy::$policy,
                    normalize: $norm,
                    accessor: |record| &mut record.$field,
                },
            )*
        ];
    };
}

financial_schema! {
    // profile, rating, consensus & peers ----------------------------------------------------------
    symbol: "Symbol" <- "symbol", Single, RAW;
    company_name: "CompanyName" <- "companyName", Single, RAW;
    currency: "Currency" <- "currency", Single, NUM;
    exchange: "Exchange" <- "exchange", Single, NUM;
    exchange_short_name: "ExchangeShortName" <- "exchangeShortName", Single, NUM;
    industry: "Industry" <- "industry", Single, NUM;
    sector: "Sector" <- "sector", Single, NUM;
    country: "Country" <- "country", Single, NUM;
    description: "Description" <- "description", Single, RAW;
    ceo: "Ceo" <- "ceo", Single, RAW;
    website: "Website" <- "website", Single, NUM;
    image: "Image" <- "image", Single, NUM;
    ipo_date: "IpoDate" <- "ipoDate", Single, NUM;
    address: "Address" <- "address", Single, RAW;
    state: "State" <- "state", Single, RAW;
    county: "County" <- "county", Single, RAW;
    city: "City" <- "city", Single, RAW;
    zip: "Zip" <- "zip", Single, NUM;
    full_time_employees: "FullTimeEmployees" <- "fullTimeEmployees", Single, NUM;
    is_etf: "IsEtf" <- "isEtf", Single, NUM;
    is_actively_trading: "IsActivelyTrading" <- "isActivelyTrading", Single, NUM;
    price: "Price" <- "price", Single, NUM;
    beta: "Beta" <- "beta", Single, NUM;
    mkt_cap: "MktCap" <- "mktCap", Single, NUM;
    vol_avg: "VolAvg" <- "volAvg", Single, NUM;
    last_div: "LastDiv" <- "lastDiv", Single, NUM;
    range: "Range" <- "range", Single, NUM;
    changes: "Changes" <- "changes", Single, NUM;
    rating: "Rating" <- "rating", Single, NUM;
    rating_score: "RatingScore" <- "ratingScore", Single, NUM;
    rating_recommendation: "RatingRecommendation" <- "ratingRecommendation", Single, NUM;
    target_high: "TargetHigh" <- "targetHigh", Single, NUM;
    target_low: "TargetLow" <- "targetLow", Single, NUM;
    target_consensus: "TargetConsensus" <- "targetConsensus", Single, NUM;
    target_median: "TargetMedian" <- "targetMedian", Single, NUM;
    peers_list: "PeersList" <- "peersList", Single, RAW;

    // periods -------------------------------------------------------------------------------------
    date: "Date" <- "date", Accumulate, NUM;
    calendar_year: "CalendarYear" <- "calendarYear", Accumulate, NUM;
    period: "Period" <- "period", Accumulate, NUM;

    // esg (acronym-led provider keys keep their case)
    environmental_score: "EnvironmentalScore" <- "environmentalScore", Accumulate, NUM;
    social_score: "SocialScore" <- "socialScore", Accumulate, NUM;
    governance_score: "GovernanceScore" <- "governanceScore", Accumulate, NUM;
    esg_score: "ESGScore" <- "ESGScore", Accumulate, NUM;

    // analyst estimates
    estimated_revenue_avg: "EstimatedRevenueAvg" <- "estimatedRevenueAvg", Accumulate, NUM;
    estimated_ebitda_avg: "EstimatedEbitdaAvg" <- "estimatedEbitdaAvg", Accumulate, NUM;
    estimated_net_income_avg: "EstimatedNetIncomeAvg" <- "estimatedNetIncomeAvg", Accumulate, NUM;
    estimated_eps_avg: "EstimatedEpsAvg" <- "estimatedEpsAvg", Accumulate, NUM;
    number_analyst_estimated_revenue: "NumberAnalystEstimatedRevenue" <- "numberAnalystEstimatedRevenue", Accumulate, NUM;
    number_analysts_estimated_eps: "NumberAnalystsEstimatedEps" <- "numberAnalystsEstimatedEps", Accumulate, NUM;

    // discounted cash flow
    dcf: "Dcf" <- "dcf", Accumulate, NUM;
    stock_price: "StockPrice" <- "stockPrice", Accumulate, NUM;

    // income statement
    revenue: "Revenue" <- "revenue", Accumulate, NUM;
    cost_of_revenue: "CostOfRevenue" <- "costOfRevenue", Accumulate, NUM;
    gross_profit: "GrossProfit" <- "grossProfit", Accumulate, NUM;
    gross_profit_ratio: "GrossProfitRatio" <- "grossProfitRatio", Accumulate, NUM;
    research_and_development_expenses: "ResearchAndDevelopmentExpenses" <- "researchAndDevelopmentExpenses", Accumulate, NUM;
    operating_expenses: "OperatingExpenses" <- "operatingExpenses", Accumulate, NUM;
    operating_income: "OperatingIncome" <- "operatingIncome", Accumulate, NUM;
    interest_expense: "InterestExpense" <- "interestExpense", Accumulate, NUM;
    ebitda: "Ebitda" <- "ebitda", Accumulate, NUM;
    income_before_tax: "IncomeBeforeTax" <- "incomeBeforeTax", Accumulate, NUM;
    net_income: "NetIncome" <- "netIncome", Accumulate, NUM;
    eps: "Eps" <- "eps", Accumulate, NUM;
    epsdiluted: "Epsdiluted" <- "epsdiluted", Accumulate, NUM;
    weighted_average_shs_out: "WeightedAverageShsOut" <- "weightedAverageShsOut", Accumulate, NUM;

    // balance sheet
    cash_and_cash_equivalents: "CashAndCashEquivalents" <- "cashAndCashEquivalents", Accumulate, NUM;
    total_current_assets: "TotalCurrentAssets" <- "totalCurrentAssets", Accumulate, NUM;
    total_assets: "TotalAssets" <- "totalAssets", Accumulate, NUM;
    total_current_liabilities: "TotalCurrentLiabilities" <- "totalCurrentLiabilities", Accumulate, NUM;
    total_liabilities: "TotalLiabilities" <- "totalLiabilities", Accumulate, NUM;
    total_stockholders_equity: "TotalStockholdersEquity" <- "totalStockholdersEquity", Accumulate, NUM;
    retained_earnings: "RetainedEarnings" <- "retainedEarnings", Accumulate, NUM;
    goodwill: "Goodwill" <- "goodwill", Accumulate, NUM;
    total_debt: "TotalDebt" <- "totalDebt", Accumulate, NUM;
    net_debt: "NetDebt" <- "netDebt", Accumulate, NUM;

    // cash flow statement
    operating_cash_flow: "OperatingCashFlow" <- "operatingCashFlow", Accumulate, NUM;
    capital_expenditure: "CapitalExpenditure" <- "capitalExpenditure", Accumulate, NUM;
    free_cash_flow: "FreeCashFlow" <- "freeCashFlow", Accumulate, NUM;
    dividends_paid: "DividendsPaid" <- "dividendsPaid", Accumulate, NUM;
    common_stock_repurchased: "CommonStockRepurchased" <- "commonStockRepurchased", Accumulate, NUM;
    stock_based_compensation: "StockBasedCompensation" <- "stockBasedCompensation", Accumulate, NUM;

    // ratios
    current_ratio: "CurrentRatio" <- "currentRatio", Accumulate, NUM;
    quick_ratio: "QuickRatio" <- "quickRatio", Accumulate, NUM;
    gross_profit_margin: "GrossProfitMargin" <- "grossProfitMargin", Accumulate, NUM;
    operating_profit_margin: "OperatingProfitMargin" <- "operatingProfitMargin", Accumulate, NUM;
    net_profit_margin: "NetProfitMargin" <- "netProfitMargin", Accumulate, NUM;
    return_on_assets: "ReturnOnAssets" <- "returnOnAssets", Accumulate, NUM;
    return_on_equity: "ReturnOnEquity" <- "returnOnEquity", Accumulate, NUM;
    debt_equity_ratio: "DebtEquityRatio" <- "debtEquityRatio", Accumulate, NUM;
    interest_coverage: "InterestCoverage" <- "interestCoverage", Accumulate, NUM;
    payout_ratio: "PayoutRatio" <- "payoutRatio", Accumulate, NUM;
    price_earnings_ratio: "PriceEarningsRatio" <- "priceEarningsRatio", Accumulate, NUM;
    price_to_book_ratio: "PriceToBookRatio" <- "priceToBookRatio", Accumulate, NUM;
    price_to_sales_ratio: "PriceToSalesRatio" <- "priceToSalesRatio", Accumulate, NUM;
    price_earnings_to_growth_ratio: "PriceEarningsToGrowthRatio" <- "priceEarningsToGrowthRatio", Accumulate, NUM;
    dividend_yield: "DividendYield" <- "dividendYield", Accumulate, NUM;

    // key metrics
    revenue_per_share: "RevenuePerShare" <- "revenuePerShare", Accumulate, NUM;
    net_income_per_share: "NetIncomePerShare" <- "netIncomePerShare", Accumulate, NUM;
    book_value_per_share: "BookValuePerShare" <- "bookValuePerShare", Accumulate, NUM;
    free_cash_flow_per_share: "FreeCashFlowPerShare" <- "freeCashFlowPerShare", Accumulate, NUM;
    market_cap: "MarketCap" <- "marketCap", Accumulate, NUM;
    enterprise_value: "EnterpriseValue" <- "enterpriseValue", Accumulate, NUM;
    pe_ratio: "PeRatio" <- "peRatio", Accumulate, NUM;
    ev_to_sales: "EvToSales" <- "evToSales", Accumulate, NUM;
    enterprise_value_over_ebitda: "EnterpriseValueOverEBITDA" <- "enterpriseValueOverEBITDA", Accumulate, NUM;
    earnings_yield: "EarningsYield" <- "earningsYield", Accumulate, NUM;
    free_cash_flow_yield: "FreeCashFlowYield" <- "freeCashFlowYield", Accumulate, NUM;
    roic: "Roic" <- "roic", Accumulate, NUM;
    graham_number: "GrahamNumber" <- "grahamNumber", Accumulate, NUM;
}

impl FinancialRecord {
    /// The provider flags exchange-traded funds in the profile.
    pub fn is_etf(&self) -> bool {
        self.is_etf.eq_ignore_ascii_case("true")
    }

    /// No endpoint answered for the symbol.
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// Map merged ranks onto the canonical record.
///
/// Rank 0 seeds every field; later ranks are appended to the accumulated fields and
/// ignored by the single ones. No ranks at all gives the default (empty) record.
pub fn format_record(ranks: &[Rank]) -> FinancialRecord {
    let mut record = FinancialRecord::default();

    for spec in SCHEMA {
        for (i, rank) in ranks.iter().enumerate() {
            let value = spec.read(rank);
            let slot = (spec.accessor)(&mut record);
            match (i, spec.policy) {
                (0, _) => *slot = value,
                (_, Policy::Single) => {}
                (_, Policy::Accumulate) => {
                    slot.push_str(SEPARATOR);
                    slot.push_str(&value);
                }
            }
        }
    }

    record
}

/// Fetch, merge & format the financial record of `symbol`.
pub async fn fetch_financials<H: Http>(
    http: &H,
    symbol: &str,
    api_key: &str,
) -> FinancialRecord {
    let requests = financial_endpoints(symbol, api_key);
    let payloads = collect_payloads(http, symbol, &requests).await;
    debug!(
        "[{symbol}] {} of {} endpoints answered",
        payloads.len(),
        requests.len()
    );

    let ranks = merge_ranks(payloads);
    debug!("[{symbol}] {} ranks merged", ranks.len());
    format_record(&ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashSet;

    fn ranks(values: Value) -> Vec<Rank> {
        serde_json::from_value(values).expect("array of objects")
    }

    fn lower_first(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    #[test]
    fn table_names_and_keys_are_unique() {
        let names: HashSet<_> = SCHEMA.iter().map(|f| f.name).collect();
        let keys: HashSet<_> = SCHEMA.iter().map(|f| f.key).collect();
        assert_eq!(names.len(), SCHEMA.len());
        assert_eq!(keys.len(), SCHEMA.len());
    }

    #[test]
    fn keys_are_names_with_the_first_letter_lowered() {
        for spec in SCHEMA {
            let acronym_led = spec.name.chars().take(2).all(|c| c.is_ascii_uppercase());
            if !acronym_led {
                assert_eq!(spec.key, lower_first(spec.name), "{spec:?}");
            }
        }
    }

    #[test]
    fn textual_fields_are_not_normalized() {
        let raw: HashSet<_> = SCHEMA
            .iter()
            .filter(|f| !f.normalize)
            .map(|f| f.key)
            .collect();
        let expected: HashSet<_> = [
            "symbol",
            "companyName",
            "description",
            "ceo",
            "address",
            "state",
            "county",
            "city",
            "peersList",
        ]
        .into_iter()
        .collect();
        assert_eq!(raw, expected);
    }

    #[test]
    fn accessors_reach_their_own_field() {
        let mut record = FinancialRecord::default();
        for spec in SCHEMA {
            *(spec.accessor)(&mut record) = spec.name.to_string();
        }

        let stored = serde_json::to_value(&record).expect("record");
        for spec in SCHEMA {
            assert_eq!(stored[spec.name], spec.name);
        }
    }

    #[test]
    fn no_ranks_give_the_empty_record() {
        let record = format_record(&[]);
        assert_eq!(record, FinancialRecord::default());
        assert!(record.is_empty());
        assert!(!record.is_etf());
    }

    #[test]
    fn singles_keep_rank_zero() {
        let record = format_record(&ranks(json!([
            {"symbol": "AAPL", "companyName": "Apple Inc.", "rating": "A"},
            {"symbol": "OTHER", "companyName": "Other", "rating": "F"},
            {"symbol": "LAST", "rating": "C"},
        ])));

        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.company_name, "Apple Inc.");
        assert_eq!(record.rating, "A");
    }

    #[test]
    fn accumulated_fields_read_newest_first() {
        let record = format_record(&ranks(json!([
            {"date": "2023-09-30", "revenue": 383285000000_i64},
            {"date": "2022-09-24", "revenue": 394328000000_i64},
            {"date": "2021-09-25", "revenue": 365817000000_i64},
        ])));

        assert_eq!(record.date, "2023-09-30, 2022-09-24, 2021-09-25");
        assert_eq!(record.revenue, "383285000000, 394328000000, 365817000000");
        let values: Vec<&str> = record.revenue.split(SEPARATOR).collect();
        assert_eq!(values.len(), 3);
        assert!(!record.revenue.ends_with(SEPARATOR));
    }

    #[test]
    fn missing_periods_keep_their_place() {
        let record = format_record(&ranks(json!([
            {"eps": 6.13},
            {},
            {"eps": 5.61},
        ])));

        assert_eq!(record.eps, "6.13, , 5.61");
    }

    #[test]
    fn decimal_commas_are_normalized_except_for_text() {
        let record = format_record(&ranks(json!([{
            "price": "189,95",
            "currentRatio": "0,98",
            "companyName": "Acme, Inc.",
            "address": "1 Main St, Suite 2",
            "peersList": ["MSFT", "GOOGL"],
        }])));

        assert_eq!(record.price, "189.95");
        assert_eq!(record.current_ratio, "0.98");
        assert_eq!(record.company_name, "Acme, Inc.");
        assert_eq!(record.address, "1 Main St, Suite 2");
        assert_eq!(record.peers_list, "MSFT,GOOGL");
    }

    #[test]
    fn etf_flag_comes_from_the_profile() {
        let record = format_record(&ranks(json!([{"symbol": "SPY", "isEtf": true}])));
        assert!(record.is_etf());

        let record = format_record(&ranks(json!([{"symbol": "AAPL", "isEtf": false}])));
        assert!(!record.is_etf());
    }
}
