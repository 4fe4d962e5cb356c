////////////////////////////////////////////////////////////////////////////////////////////////////
//
// API Documentation: https://site.financialmodelingprep.com/developer/docs
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Data category of a financial endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Esg,
    PriceTarget,
    Peers,
    AnalystEstimates,
    DiscountedCashFlow,
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Ratios,
    KeyMetrics,
    Profile,
    Rating,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Esg => "esg",
            Self::PriceTarget => "price-target-consensus",
            Self::Peers => "stock-peers",
            Self::AnalystEstimates => "analyst-estimates",
            Self::DiscountedCashFlow => "historical-dcf",
            Self::IncomeStatement => "income-statement",
            Self::BalanceSheet => "balance-sheet-statement",
            Self::CashFlow => "cash-flow-statement",
            Self::Ratios => "ratios",
            Self::KeyMetrics => "key-metrics",
            Self::Profile => "profile",
            Self::Rating => "rating",
        }
    }
}

/// A request template for one provider data category.
#[derive(Clone, Copy, Debug)]
pub struct EndpointDescriptor {
    pub category: Category,
    /// Path relative to the base URL, with `{symbol}` & `{key}` placeholders.
    pub template: &'static str,
    pub premium: bool,
}

/// The endpoints behind one financial record.
///
/// Order is merge precedence: where two endpoints return the same field for the same
/// period, the later one wins.
pub static FINANCIAL_ENDPOINTS: [EndpointDescriptor; 12] = [
    EndpointDescriptor {
        category: Category::Esg,
        template: "v4/esg-environmental-social-governance-data?symbol={symbol}&apikey={key}",
        premium: true,
    },
    EndpointDescriptor {
        category: Category::PriceTarget,
        template: "v4/price-target-consensus?symbol={symbol}&apikey={key}",
        premium: true,
    },
    EndpointDescriptor {
        category: Category::Peers,
        template: "v4/stock_peers?symbol={symbol}&apikey={key}",
        premium: true,
    },
    EndpointDescriptor {
        category: Category::AnalystEstimates,
        template: "v3/analyst-estimates/{symbol}?apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::DiscountedCashFlow,
        template: "v3/historical-discounted-cash-flow-statement/{symbol}?apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::IncomeStatement,
        template: "v3/income-statement/{symbol}?apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::BalanceSheet,
        template: "v3/balance-sheet-statement/{symbol}?apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::CashFlow,
        template: "v3/cash-flow-statement/{symbol}?apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::Ratios,
        template: "v3/ratios/{symbol}?limit=120&apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::KeyMetrics,
        template: "v3/key-metrics/{symbol}?limit=120&apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::Profile,
        template: "v3/profile/{symbol}?apikey={key}",
        premium: false,
    },
    EndpointDescriptor {
        category: Category::Rating,
        template: "v3/rating/{symbol}?apikey={key}",
        premium: false,
    },
];

const STOCK_LIST: &str = "v3/stock/list?apikey={key}";
const PRICE_HISTORY: &str = "v3/historical-price-full/{symbol}?apikey={key}";
const INDICATOR: &str =
    "v3/technical_indicator/daily/{symbol}?period={period}&type={kind}&apikey={key}";

/// A descriptor with its placeholders filled in, ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub category: Category,
    pub path: String,
    pub premium: bool,
}

impl EndpointDescriptor {
    pub fn request(&self, symbol: &str, key: &str) -> Request {
        Request {
            category: self.category,
            path: fill(self.template, symbol, key),
            premium: self.premium,
        }
    }
}

/// Every request behind the financial record of `symbol`, in merge order.
pub fn financial_endpoints(symbol: &str, key: &str) -> Vec<Request> {
    FINANCIAL_ENDPOINTS
        .iter()
        .map(|endpoint| endpoint.request(symbol, key))
        .collect()
}

/// The provider's symbol universe.
pub fn stock_list(key: &str) -> String {
    STOCK_LIST.replace("{key}", key)
}

/// Full daily OHLCV history of `symbol`.
pub fn price_history(symbol: &str, key: &str) -> String {
    fill(PRICE_HISTORY, symbol, key)
}

/// Daily technical indicator `kind` (e.g. `sma`) at `period`.
pub fn indicator(symbol: &str, kind: &str, period: u32, key: &str) -> String {
    fill(INDICATOR, symbol, key)
        .replace("{period}", &period.to_string())
        .replace("{kind}", kind)
}

fn fill(template: &str, symbol: &str, key: &str) -> String {
    template.replace("{symbol}", symbol).replace("{key}", key)
}

/// Hide the API key of a request path, for logging.
pub fn redact(path: &str) -> String {
    const PARAM: &str = "apikey=";
    match path.find(PARAM) {
        Some(start) => {
            let value = start + PARAM.len();
            let end = path[value..]
                .find('&')
                .map(|i| value + i)
                .unwrap_or(path.len());
            format!("{}***{}", &path[..value], &path[end..])
        }
        None => path.to_string(),
    }
}
