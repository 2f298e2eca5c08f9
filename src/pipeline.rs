use chrono::NaiveDateTime;
use tracing::{error, info};

use crate::config::{FilterConfig, Settings};
use crate::error::Result;
use crate::filter::{evaluate, is_candidate};
use crate::grouping::{resolve, Resolution};
use crate::loader::{load_items, save_items, OutputFormat};
use crate::model::{AnalyticRecord, RawItem, VerdictReport};
use crate::normalize::base_identity;
use crate::stats::transform_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub loaded: usize,
    pub good: usize,
    pub bad: usize,
}

/// Transform and classify an in-memory batch.
pub fn classify(raws: &[RawItem], now: NaiveDateTime, cfg: &FilterConfig) -> (Vec<AnalyticRecord>, Resolution) {
    let records = transform_all(raws, now, cfg.sales_window_days);
    let resolution = resolve(&records, &cfg.owned_marker, |r| is_candidate(r, cfg));
    (records, resolution)
}

pub fn build_report(records: &[AnalyticRecord], cfg: &FilterConfig) -> Vec<VerdictReport> {
    records
        .iter()
        .map(|r| {
            let verdict = evaluate(r, cfg);
            VerdictReport {
                name: r.name.clone(),
                wear: r.wear.clone(),
                base_identity: base_identity(&r.name, &cfg.owned_marker).to_string(),
                sales: r.sales,
                offer_prices_list: r.offer_prices_list(),
                target_price_list: r.target_price_list(),
                profit_margin_pair1: r.profit_margin_pair1,
                profit_margin_pair2: r.profit_margin_pair2,
                average_recent_sale_price: r.average_recent_sale_price,
                price_variance: r.price_variance,
                price_consistent: verdict.price_consistent,
                candidate: verdict.candidate,
                rule: verdict.rule,
            }
        })
        .collect()
}

/// Load, classify and write both partitions.
///
/// A load failure counts as an empty batch. Both outputs are always
/// attempted; the first write failure is returned afterwards.
pub fn run(settings: &Settings, now: NaiveDateTime) -> Result<BatchSummary> {
    let input = settings.input_path();
    let raws = match load_items(&input) {
        Ok(items) => items,
        Err(e) => {
            error!("Error reading aggregated file: {}", e);
            Vec::new()
        }
    };
    info!(count = raws.len(), path = %input.display(), "loaded raw items");

    let cfg = &settings.filters;
    let (records, resolution) = classify(&raws, now, cfg);

    let format = OutputFormat::from_ndjson(settings.ndjson);
    let mut writes = vec![
        save_items(&resolution.good, &settings.good_output_path(), format),
        save_items(&resolution.bad, &settings.bad_output_path(), format),
    ];

    if let Some(report_path) = &settings.report {
        writes.push(save_items(&build_report(&records, cfg), report_path, OutputFormat::Ndjson));
    }

    let mut first_err = None;
    for result in writes {
        if let Err(e) = result {
            error!("Error saving items: {}", e);
            first_err.get_or_insert(e);
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    let summary = BatchSummary {
        loaded: raws.len(),
        good: resolution.good.len(),
        bad: resolution.bad.len(),
    };
    info!(
        good = summary.good,
        bad = summary.bad,
        "Filtering complete: {} good items, {} bad items saved.",
        summary.good,
        summary.bad
    );
    Ok(summary)
}
