use statrs::statistics::Statistics;
use tracing::debug;

use crate::config::FilterConfig;
use crate::model::{AnalyticRecord, Rule, Verdict};

/// Spread check on recent sale prices: max/min must stay under a threshold
/// that is looser for cheap items.
pub fn is_price_consistent(prices: &[f64], cfg: &FilterConfig) -> bool {
    if prices.is_empty() {
        return false;
    }

    let min = prices.min();
    if min == 0.0 {
        return false;
    }

    let ratio = prices.max() / min;
    let threshold = if prices.mean() < cfg.low_price_boundary {
        cfg.price_consistency_threshold_low_price
    } else {
        cfg.price_consistency_threshold_strict
    };

    ratio <= threshold
}

pub fn is_good_candidate(record: &AnalyticRecord, cfg: &FilterConfig) -> bool {
    if record.sales < cfg.min_sales_exception {
        debug!(
            item = %record.name,
            sales = record.sales,
            "below {} sales, marking as bad candidate",
            cfg.min_sales_exception
        );
        return false;
    }

    if record.offers.is_empty() || record.targets.is_empty() {
        debug!(
            item = %record.name,
            offer_qty = record.offers.len(),
            target_qty = record.targets.len(),
            "missing offer or target price list"
        );
        return false;
    }

    debug!(item = %record.name, sales = record.sales, "qualifies as a good candidate");
    true
}

pub fn passes_profit_margin(record: &AnalyticRecord, cfg: &FilterConfig) -> bool {
    if record.sales < cfg.min_sales_exception {
        return false;
    }

    let factor = if record.sales >= cfg.min_sales_normal {
        cfg.profit_margin_normal
    } else {
        cfg.profit_margin_exception
    };

    let passes = record.profit_margin_pair1 >= factor || record.profit_margin_pair2 >= factor;
    if passes {
        debug!(
            item = %record.name,
            pm1 = record.profit_margin_pair1,
            pm2 = record.profit_margin_pair2,
            factor,
            "passes profit margin check"
        );
    }
    passes
}

/// Full decision for one record. Price consistency is always computed and
/// reported; it only gates candidacy with `require_price_consistency`.
pub fn evaluate(record: &AnalyticRecord, cfg: &FilterConfig) -> Verdict {
    let price_consistent = is_price_consistent(&record.recent_prices(), cfg);

    let verdict = |candidate, rule| Verdict {
        candidate,
        rule,
        price_consistent,
    };

    if record.sales < cfg.min_sales_exception {
        return verdict(false, Rule::VolumeCut);
    }

    let good = is_good_candidate(record, cfg);
    if good && price_consistent {
        return verdict(true, Rule::ConsistencyPass);
    }
    if good && !cfg.require_price_consistency {
        return verdict(true, Rule::CandidacyPass);
    }

    if passes_profit_margin(record, cfg) {
        return verdict(true, Rule::MarginOverride);
    }

    if good {
        verdict(false, Rule::PriceInconsistent)
    } else {
        verdict(false, Rule::MissingOrderBook)
    }
}

pub fn is_candidate(record: &AnalyticRecord, cfg: &FilterConfig) -> bool {
    evaluate(record, cfg).candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderLevel, RecentSale};

    fn level(price: f64) -> OrderLevel {
        OrderLevel {
            price,
            quantity: "1".to_string(),
        }
    }

    fn record(sales: usize, pm1: f64, pm2: f64) -> AnalyticRecord {
        let mut r = AnalyticRecord::empty("Metal Facemask".to_string(), None);
        r.sales = sales;
        r.profit_margin_pair1 = pm1;
        r.profit_margin_pair2 = pm2;
        r
    }

    fn with_book(mut r: AnalyticRecord) -> AnalyticRecord {
        r.offers = vec![level(10.0), level(11.0)];
        r.targets = vec![level(9.5), level(9.0)];
        r
    }

    fn with_sales_prices(mut r: AnalyticRecord, prices: &[f64]) -> AnalyticRecord {
        r.recent_sales_prices = prices
            .iter()
            .map(|p| RecentSale {
                price: *p,
                date_time: "2025-03-14 10:00:00".to_string(),
                operation: "Offer".to_string(),
            })
            .collect();
        r
    }

    #[test]
    fn test_price_consistency() {
        let cfg = FilterConfig::default();
        assert!(!is_price_consistent(&[], &cfg));
        assert!(is_price_consistent(&[5.0, 5.0, 5.0], &cfg));
        // mean 5.5 uses the strict threshold
        assert!(!is_price_consistent(&[1.0, 10.0], &cfg));
        assert!(!is_price_consistent(&[0.0, 2.0], &cfg));
    }

    #[test]
    fn test_price_consistency_low_price_threshold() {
        let cfg = FilterConfig::default();
        // mean 2.5, ratio 4.0
        assert!(is_price_consistent(&[1.0, 4.0], &cfg));
        // mean 2.6, ratio 4.2
        assert!(is_price_consistent(&[1.0, 4.2], &cfg));
        assert!(!is_price_consistent(&[1.0, 4.5], &cfg));
        // mean 10.5, ratio 1.1
        assert!(is_price_consistent(&[10.0, 11.0], &cfg));
        assert!(!is_price_consistent(&[10.0, 12.5], &cfg));
    }

    #[test]
    fn test_low_volume_rejected_everywhere() {
        let cfg = FilterConfig::default();
        let r = with_book(record(5, 10.0, 10.0));
        assert!(!is_good_candidate(&r, &cfg));
        assert!(!passes_profit_margin(&r, &cfg));
        assert_eq!(evaluate(&r, &cfg).rule, Rule::VolumeCut);
        assert!(!is_candidate(&r, &cfg));
    }

    #[test]
    fn test_good_candidate_needs_both_lists() {
        let cfg = FilterConfig::default();
        assert!(is_good_candidate(&with_book(record(7, 1.0, 1.0)), &cfg));

        let mut no_targets = with_book(record(7, 1.0, 1.0));
        no_targets.targets.clear();
        assert!(!is_good_candidate(&no_targets, &cfg));

        let mut no_offers = with_book(record(30, 1.0, 1.0));
        no_offers.offers.clear();
        assert!(!is_good_candidate(&no_offers, &cfg));
        assert_eq!(evaluate(&no_offers, &cfg).rule, Rule::MissingOrderBook);
    }

    #[test]
    fn test_margin_normal_factor() {
        let cfg = FilterConfig::default();
        assert!(passes_profit_margin(&record(20, 1.16, 0.5), &cfg));
        assert!(passes_profit_margin(&record(15, 0.5, 1.15), &cfg));
        assert!(!passes_profit_margin(&record(20, 1.14, 1.10), &cfg));
    }

    #[test]
    fn test_margin_exception_factor_boundary() {
        let cfg = FilterConfig::default();
        // 10 sales needs 1.30
        assert!(!passes_profit_margin(&record(10, 1.25, 1.0), &cfg));
        assert!(passes_profit_margin(&record(10, 1.30, 1.0), &cfg));
        assert!(passes_profit_margin(&record(14, 1.0, 1.31), &cfg));
    }

    #[test]
    fn test_margin_override_without_order_book() {
        let cfg = FilterConfig::default();
        let r = record(16, 200.0, 1.0);
        assert!(!is_good_candidate(&r, &cfg));
        let verdict = evaluate(&r, &cfg);
        assert!(verdict.candidate);
        assert_eq!(verdict.rule, Rule::MarginOverride);
    }

    #[test]
    fn test_consistency_reported_but_not_gating_by_default() {
        let cfg = FilterConfig::default();
        let r = with_sales_prices(with_book(record(8, 1.0, 1.0)), &[10.0, 30.0]);

        let verdict = evaluate(&r, &cfg);
        assert!(verdict.candidate);
        assert!(!verdict.price_consistent);
        assert_eq!(verdict.rule, Rule::CandidacyPass);

        let steady = with_sales_prices(with_book(record(8, 1.0, 1.0)), &[10.0, 11.0]);
        assert_eq!(evaluate(&steady, &cfg).rule, Rule::ConsistencyPass);
    }

    #[test]
    fn test_consistency_gate_when_required() {
        let cfg = FilterConfig {
            require_price_consistency: true,
            ..FilterConfig::default()
        };

        let erratic = with_sales_prices(with_book(record(8, 1.0, 1.0)), &[10.0, 30.0]);
        let verdict = evaluate(&erratic, &cfg);
        assert!(!verdict.candidate);
        assert_eq!(verdict.rule, Rule::PriceInconsistent);

        let steady = with_sales_prices(with_book(record(8, 1.0, 1.0)), &[10.0, 11.0]);
        assert_eq!(evaluate(&steady, &cfg).rule, Rule::ConsistencyPass);

        // the margin override still rescues an erratic item
        let wide = with_sales_prices(with_book(record(8, 1.4, 1.0)), &[10.0, 30.0]);
        assert_eq!(evaluate(&wide, &cfg).rule, Rule::MarginOverride);
    }
}
