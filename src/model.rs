use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSaleEvent {
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub date_time: Option<String>,
    // Older exports split the timestamp in two
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrderEntry {
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub quantity: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub wear: Option<String>,
    #[serde(default)]
    pub sales_history: Vec<RawSaleEvent>,
    #[serde(default)]
    pub target_prices: Vec<RawOrderEntry>,
    #[serde(default)]
    pub offer_prices: Vec<RawOrderEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentSale {
    pub price: f64,
    pub date_time: String,
    pub operation: String,
}

/// One retained row of the offer or target table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLevel {
    pub price: f64,
    pub quantity: String,  // Raw text, never parsed
}

#[derive(Debug, Clone)]
pub struct AnalyticRecord {
    pub name: String,
    pub wear: Option<String>,

    pub sales: usize,  // Only sales inside the trailing window
    pub recent_sales_prices: Vec<RecentSale>,

    pub offers: Vec<OrderLevel>,   // Lowest first, at most 3
    pub targets: Vec<OrderLevel>,  // Highest first, at most 3
    pub offer_prices_quantity: usize,
    pub target_price_list_quantity: usize,

    pub profit_margin_pair1: f64,
    pub profit_margin_pair2: f64,

    pub average_recent_sale_price: f64,
    pub price_variance: f64,
}

impl AnalyticRecord {
    pub fn empty(name: String, wear: Option<String>) -> Self {
        AnalyticRecord {
            name,
            wear,
            sales: 0,
            recent_sales_prices: Vec::new(),
            offers: Vec::new(),
            targets: Vec::new(),
            offer_prices_quantity: 0,
            target_price_list_quantity: 0,
            profit_margin_pair1: 1.0,
            profit_margin_pair2: 1.0,
            average_recent_sale_price: 0.0,
            price_variance: 0.0,
        }
    }

    pub fn offer_prices_list(&self) -> Vec<f64> {
        self.offers.iter().map(|o| o.price).collect()
    }

    pub fn target_price_list(&self) -> Vec<f64> {
        self.targets.iter().map(|t| t.price).collect()
    }

    pub fn recent_prices(&self) -> Vec<f64> {
        self.recent_sales_prices.iter().map(|s| s.price).collect()
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            name: self.name.clone(),
            wear: self.wear.clone(),
        }
    }
}

/// What ends up in the good/bad output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub name: String,
    pub wear: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    VolumeCut,
    MissingOrderBook,
    PriceInconsistent,
    ConsistencyPass,
    // accepted while recent prices were not consistent
    CandidacyPass,
    MarginOverride,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub candidate: bool,
    pub rule: Rule,
    pub price_consistent: bool,
}

/// Per-record line of the optional verdict report.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictReport {
    pub name: String,
    pub wear: Option<String>,
    pub base_identity: String,
    pub sales: usize,
    pub offer_prices_list: Vec<f64>,
    pub target_price_list: Vec<f64>,
    pub profit_margin_pair1: f64,
    pub profit_margin_pair2: f64,
    pub average_recent_sale_price: f64,
    pub price_variance: f64,
    pub price_consistent: bool,
    pub candidate: bool,
    pub rule: Rule,
}
