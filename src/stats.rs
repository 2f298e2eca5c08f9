use chrono::{Duration, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::model::{AnalyticRecord, OrderLevel, RawItem, RawOrderEntry, RawSaleEvent, RecentSale};
use crate::normalize::normalize;

const BOOK_DEPTH: usize = 3;

// Stand-in for a missing price when building margin pairs
const MISSING_PRICE: f64 = 0.01;

// Tried in order, first match wins
const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",      // 2025-02-03 14:30:00
    "%b %d, %Y, %I:%M %p",    // Feb 03, 2025, 06:46 PM
    "%b %d, %Y at %I:%M %p",  // Mar 09, 2025 at 04:02 PM
];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn transform_all(raws: &[RawItem], now: NaiveDateTime, window_days: i64) -> Vec<AnalyticRecord> {
    raws.par_iter()
        .map(|raw| transform(raw, now, window_days))
        .collect()
}

pub fn transform(raw: &RawItem, now: NaiveDateTime, window_days: i64) -> AnalyticRecord {
    let mut record = AnalyticRecord::empty(normalize(&raw.name), raw.wear.clone());

    let cutoff = window_start(now, window_days);
    record.recent_sales_prices = recent_sales(&record.name, &raw.sales_history, cutoff);
    record.sales = record.recent_sales_prices.len();

    let mut offers = parse_levels(&record.name, &raw.offer_prices);
    offers.sort_by(|a, b| a.price.total_cmp(&b.price));
    offers.truncate(BOOK_DEPTH);

    let mut targets = parse_levels(&record.name, &raw.target_prices);
    targets.sort_by(|a, b| b.price.total_cmp(&a.price));
    targets.truncate(BOOK_DEPTH);

    record.profit_margin_pair1 = margin_pair(&offers, &targets, 0);
    record.profit_margin_pair2 = margin_pair(&offers, &targets, 1);
    debug!(
        item = %record.name,
        pair1 = record.profit_margin_pair1,
        pair2 = record.profit_margin_pair2,
        "profit margins"
    );

    record.offer_prices_quantity = offers.len();
    record.target_price_list_quantity = targets.len();
    record.offers = offers;
    record.targets = targets;

    let prices = record.recent_prices();
    record.average_recent_sale_price = if prices.is_empty() {
        0.0
    } else {
        prices.iter().mean()
    };
    record.price_variance = if prices.len() > 1 {
        prices.iter().variance()
    } else {
        0.0
    };

    record
}

// Negative windows count nothing newer than `now`; windows past chrono's
// range reach back to the earliest representable time.
fn window_start(now: NaiveDateTime, window_days: i64) -> NaiveDateTime {
    Duration::try_days(window_days.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(NaiveDateTime::MIN)
}

fn recent_sales(name: &str, history: &[RawSaleEvent], cutoff: NaiveDateTime) -> Vec<RecentSale> {
    let mut recent = Vec::new();

    for sale in history {
        if sale.price.trim().is_empty() {
            continue;
        }

        let Some(price) = parse_price(&sale.price) else {
            warn!(item = %name, price = %sale.price, "skipping sale with unparseable price");
            continue;
        };

        let Some(date_time) = sale_date_time(sale) else {
            warn!(item = %name, "skipping sale without a date");
            continue;
        };

        let Some(sold_at) = parse_date(&date_time) else {
            warn!(item = %name, date_time = %date_time, "date does not match any expected format");
            continue;
        };

        if sold_at >= cutoff {
            recent.push(RecentSale {
                price,
                date_time,
                operation: sale.operation.clone(),
            });
        }
    }

    recent
}

// Direct field first, then "<date> <time>", then the bare date.
fn sale_date_time(sale: &RawSaleEvent) -> Option<String> {
    if let Some(dt) = non_empty(&sale.date_time) {
        return Some(dt.to_string());
    }

    match (non_empty(&sale.date), non_empty(&sale.time)) {
        (Some(date), Some(time)) => Some(format!("{} {}", date, time)),
        (Some(date), None) => Some(date.to_string()),
        _ => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_levels(name: &str, entries: &[RawOrderEntry]) -> Vec<OrderLevel> {
    entries
        .iter()
        .filter(|e| !e.price.trim().is_empty())
        .filter_map(|e| match parse_price(&e.price) {
            Some(price) => Some(OrderLevel {
                price,
                quantity: e.quantity.clone(),
            }),
            None => {
                warn!(item = %name, price = %e.price, "skipping order entry with unparseable price");
                None
            }
        })
        .collect()
}

fn margin_pair(offers: &[OrderLevel], targets: &[OrderLevel], rank: usize) -> f64 {
    let offer = offers.get(rank).map_or(MISSING_PRICE, |o| o.price);
    let target = targets.get(rank).map_or(MISSING_PRICE, |t| t.price);

    // A zero target would divide by zero; treat it like a missing one
    let target = if target == 0.0 { MISSING_PRICE } else { target };
    offer / target
}

/// Parses a currency string such as `"$1,234.50"`.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMATS[0]) {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return d.and_hms_opt(0, 0, 0);
    }

    DATE_TIME_FORMATS[1..]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
