//! Aggregation over a normalized placement: by layer, by carrier, by rating,
//! plus whole-placement totals and raw quote-book statistics.
//!
//! Every function here is total: empty input gives empty/zero output, and a
//! ratio with a zero denominator is reported as `0`, never `NaN`. Output order
//! depends only on input order, so repeated runs are bit-identical.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::allocation::{NormalizedPlacement, normalize_placement};
use crate::domain::{
    CarrierSummary, CoverageScore, LayerSummary, PlacementTotals, QuoteBookStats, QuoteRecord,
    RatingBucket,
};
use crate::rating;

pub mod format;

/// Running sums shared by the layer and carrier groupings.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    capacity: f64,
    premium: f64,
    coverage_x_capacity: f64,
}

impl Totals {
    fn add(&mut self, quote: &QuoteRecord) {
        let signed = quote.signed_capacity();
        self.capacity += signed;
        self.premium += quote.signed_premium();
        self.coverage_x_capacity += quote.coverage_score.as_percent() * signed;
    }

    fn weighted_coverage(&self) -> CoverageScore {
        if self.capacity > 0.0 {
            CoverageScore::from_percent(self.coverage_x_capacity / self.capacity)
        } else {
            CoverageScore::ZERO
        }
    }
}

/// One summary per layer present in the input, ordered by layer rank.
pub fn summarize_layers(placement: &NormalizedPlacement) -> Vec<LayerSummary> {
    placement
        .layers
        .iter()
        .map(|alloc| {
            let mut totals = Totals::default();
            let mut carriers: HashSet<&str> = HashSet::new();
            for quote in placement.layer_quotes(alloc.layer) {
                totals.add(quote);
                carriers.insert(quote.carrier.as_str());
            }
            LayerSummary {
                layer: alloc.layer,
                total_capacity: totals.capacity,
                total_premium: totals.premium,
                weighted_coverage: totals.weighted_coverage(),
                carrier_count: carriers.len(),
                offered_capacity: alloc.offered_capacity,
                degenerate: alloc.degenerate,
            }
        })
        .collect()
}

/// One summary per allocated carrier, in first-seen order.
pub fn summarize_carriers(placement: &NormalizedPlacement) -> Vec<CarrierSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(CarrierSummary, Totals)> = Vec::new();

    for quote in &placement.quotes {
        let slot = *index.entry(quote.carrier.as_str()).or_insert_with(|| {
            groups.push((
                CarrierSummary {
                    carrier: quote.carrier.clone(),
                    total_capacity: 0.0,
                    total_premium: 0.0,
                    weighted_coverage: CoverageScore::ZERO,
                    quote_count: 0,
                    layers: Vec::new(),
                },
                Totals::default(),
            ));
            groups.len() - 1
        });

        let (summary, totals) = &mut groups[slot];
        totals.add(quote);
        summary.quote_count += 1;
        if !summary.layers.contains(&quote.layer) {
            summary.layers.push(quote.layer);
        }
    }

    groups
        .into_iter()
        .map(|(summary, totals)| CarrierSummary {
            total_capacity: totals.capacity,
            total_premium: totals.premium,
            weighted_coverage: totals.weighted_coverage(),
            ..summary
        })
        .collect()
}

/// Default presentation order: largest signed capacity first, ties stable.
pub fn sort_by_capacity_desc(carriers: &mut [CarrierSummary]) {
    carriers.sort_by(|a, b| {
        b.total_capacity
            .partial_cmp(&a.total_capacity)
            .unwrap_or(Ordering::Equal)
    });
}

/// Allocated quotes grouped by canonical rating label, ordered by rating rank.
pub fn rating_distribution(placement: &NormalizedPlacement) -> Vec<RatingBucket> {
    let mut buckets: Vec<RatingBucket> = Vec::new();

    for quote in &placement.quotes {
        let label = rating::canonical_label(quote.credit_rating.as_ref());
        let bucket = match buckets.iter().position(|b| b.rating == label) {
            Some(i) => &mut buckets[i],
            None => {
                buckets.push(RatingBucket {
                    rank: rating::rank(&label),
                    rating: label,
                    total_capacity: 0.0,
                    total_premium: 0.0,
                    quote_count: 0,
                });
                let last = buckets.len() - 1;
                &mut buckets[last]
            }
        };
        bucket.total_capacity += quote.signed_capacity();
        bucket.total_premium += quote.signed_premium();
        bucket.quote_count += 1;
    }

    rating::sort_by_rank(&mut buckets, |b| b.rating.as_str());
    buckets
}

/// Totals over the whole placement. `carriers` must come from the same placement.
pub fn placement_totals(placement: &NormalizedPlacement, carriers: &[CarrierSummary]) -> PlacementTotals {
    let mut totals = Totals::default();
    for quote in &placement.quotes {
        totals.add(quote);
    }

    let positive: Vec<f64> = carriers
        .iter()
        .map(|c| c.total_capacity)
        .filter(|c| *c > 0.0)
        .collect();
    let diversity_ratio = if positive.is_empty() {
        None
    } else {
        let max = positive.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = positive.iter().copied().fold(f64::INFINITY, f64::min);
        Some(max / min)
    };

    PlacementTotals {
        total_premium: totals.premium,
        total_capacity: totals.capacity,
        weighted_coverage: totals.weighted_coverage(),
        carriers_used: carriers.len(),
        diversity_ratio,
    }
}

/// Statistics over the raw offers, allocation ignored.
pub fn quote_book_stats(quotes: &[QuoteRecord]) -> QuoteBookStats {
    let carriers: HashSet<&str> = quotes.iter().map(|q| q.carrier.as_str()).collect();
    let mean_coverage = if quotes.is_empty() {
        CoverageScore::ZERO
    } else {
        let sum: f64 = quotes.iter().map(|q| q.coverage_score.as_percent()).sum();
        CoverageScore::from_percent(sum / quotes.len() as f64)
    };

    QuoteBookStats {
        quote_count: quotes.len(),
        offered_premium: quotes.iter().map(|q| q.premium).sum(),
        offered_capacity: quotes.iter().map(|q| q.capacity).sum(),
        mean_coverage,
        distinct_carriers: carriers.len(),
        allocated_quotes: quotes.iter().filter(|q| q.is_active()).count(),
    }
}

/// Everything the `summarize` view shows for one solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementReport {
    pub layers: Vec<LayerSummary>,
    /// Sorted by signed capacity, largest first.
    pub carriers: Vec<CarrierSummary>,
    pub ratings: Vec<RatingBucket>,
    pub totals: PlacementTotals,
    pub book: QuoteBookStats,
}

impl PlacementReport {
    /// Normalize and aggregate. The layer and carrier groupings run on the rayon pool.
    pub fn build(quotes: &[QuoteRecord]) -> Self {
        let placement = normalize_placement(quotes);

        let (layers, mut carriers) = rayon::join(
            || summarize_layers(&placement),
            || summarize_carriers(&placement),
        );

        let ratings = rating_distribution(&placement);
        let totals = placement_totals(&placement, &carriers);
        sort_by_capacity_desc(&mut carriers);

        Self {
            layers,
            carriers,
            ratings,
            totals,
            book: quote_book_stats(quotes),
        }
    }
}

/// One generated option next to the figures the optimizer claimed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSummary {
    pub option_id: String,
    pub reported_premium: Option<f64>,
    /// 0-1 fraction, as the optimizer reports it.
    pub reported_coverage: Option<f64>,
    pub rows_skipped: usize,
    pub report: PlacementReport,
}

/// Every option of a generated set, in payload order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionComparison {
    pub min_premium: Option<f64>,
    pub max_premium: Option<f64>,
    pub options: Vec<OptionSummary>,
}

impl OptionComparison {
    /// Option with the lowest aggregated premium; ties keep the earlier option.
    pub fn cheapest(&self) -> Option<&OptionSummary> {
        self.options.iter().reduce(|best, o| {
            if o.report.totals.total_premium < best.report.totals.total_premium {
                o
            } else {
                best
            }
        })
    }

    /// Option with the highest capacity-weighted coverage; ties keep the earlier option.
    pub fn best_covered(&self) -> Option<&OptionSummary> {
        self.options.iter().reduce(|best, o| {
            if o.report.totals.weighted_coverage > best.report.totals.weighted_coverage {
                o
            } else {
                best
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LayerId, RatingRaw};

    fn quote(carrier: &str, layer: LayerId, capacity: f64, pct: f64, coverage: f64) -> QuoteRecord {
        QuoteRecord::new(
            carrier,
            layer,
            capacity * 100_000.0,
            capacity,
            pct,
            CoverageScore::from_fraction(coverage),
        )
        .unwrap()
    }

    fn sample() -> Vec<QuoteRecord> {
        vec![
            quote("Chubb", LayerId::Excess1, 5.0, 60.0, 0.8).with_rating(RatingRaw::Code(2.0)),
            quote("AIG", LayerId::Primary, 2.0, 33.33, 0.9).with_rating(RatingRaw::Label("A".into())),
            quote("Zurich", LayerId::Primary, 3.0, 33.33, 0.8).with_rating(RatingRaw::Code(2.0)),
            quote("Chubb", LayerId::Primary, 5.0, 33.34, 0.7).with_rating(RatingRaw::Code(2.0)),
            quote("AIG", LayerId::Excess1, 4.0, 40.0, 0.6).with_rating(RatingRaw::Label("A".into())),
            quote("Travelers", LayerId::Excess1, 9.0, 0.0, 0.95),
        ]
    }

    #[test]
    fn layers_are_ranked_and_weighted_by_signed_capacity() {
        let placement = normalize_placement(&sample());
        let layers = summarize_layers(&placement);

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].layer, LayerId::Primary);
        assert_eq!(layers[1].layer, LayerId::Excess1);

        let primary = &layers[0];
        assert!((primary.total_capacity - 3.3335).abs() < 1e-9);
        assert!((primary.weighted_coverage.as_fraction() - 0.77).abs() < 1e-3);
        assert_eq!(primary.carrier_count, 3);
        assert!((primary.offered_capacity - 10.0).abs() < 1e-12);

        // Travelers has no allocation: excluded from stats, counted in offered capacity.
        let excess = &layers[1];
        assert_eq!(excess.carrier_count, 2);
        assert!((excess.total_capacity - 4.6).abs() < 1e-9);
        assert!((excess.offered_capacity - 18.0).abs() < 1e-12);
    }

    #[test]
    fn carriers_keep_first_seen_order_and_layers() {
        let placement = normalize_placement(&sample());
        let carriers = summarize_carriers(&placement);

        let names: Vec<&str> = carriers.iter().map(|c| c.carrier.as_str()).collect();
        assert_eq!(names, vec!["Chubb", "AIG", "Zurich"]);
        assert_eq!(carriers[0].layers, vec![LayerId::Excess1, LayerId::Primary]);
        assert_eq!(carriers[0].quote_count, 2);
    }

    #[test]
    fn capacity_sort_is_descending() {
        let placement = normalize_placement(&sample());
        let mut carriers = summarize_carriers(&placement);
        sort_by_capacity_desc(&mut carriers);
        assert!(carriers.windows(2).all(|w| w[0].total_capacity >= w[1].total_capacity));
    }

    #[test]
    fn empty_input_gives_empty_summaries() {
        let placement = normalize_placement(&[]);
        assert!(summarize_layers(&placement).is_empty());
        assert!(summarize_carriers(&placement).is_empty());
        assert!(rating_distribution(&placement).is_empty());

        let totals = placement_totals(&placement, &[]);
        assert_eq!(totals.weighted_coverage, CoverageScore::ZERO);
        assert_eq!(totals.diversity_ratio, None);
        assert_eq!(quote_book_stats(&[]).mean_coverage, CoverageScore::ZERO);
    }

    #[test]
    fn zero_capacity_quote_counts_for_membership_only() {
        let quotes = vec![quote("Lloyds", LayerId::Excess2, 0.0, 100.0, 0.9)];
        let placement = normalize_placement(&quotes);
        let layers = summarize_layers(&placement);

        assert_eq!(layers[0].carrier_count, 1);
        assert_eq!(layers[0].total_capacity, 0.0);
        assert_eq!(layers[0].weighted_coverage, CoverageScore::ZERO);

        let carriers = summarize_carriers(&placement);
        assert_eq!(carriers[0].layers, vec![LayerId::Excess2]);
        assert_eq!(placement_totals(&placement, &carriers).diversity_ratio, None);
    }

    #[test]
    fn zero_capacity_member_leaves_capacity_weights_intact() {
        let quotes = vec![
            quote("ZeroCap", LayerId::Primary, 0.0, 50.0, 0.2),
            quote("Real", LayerId::Primary, 5.0, 50.0, 0.9),
        ];
        let layers = summarize_layers(&normalize_placement(&quotes));

        assert_eq!(layers[0].carrier_count, 2);
        assert!((layers[0].total_capacity - 5.0).abs() < 1e-12);
        assert!((layers[0].weighted_coverage.as_fraction() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn all_zero_layer_is_degenerate_with_zero_coverage() {
        let quotes = vec![
            quote("A", LayerId::Primary, 2.0, 0.0, 0.9),
            quote("B", LayerId::Primary, 3.0, 0.0, 0.8),
        ];
        let layers = summarize_layers(&normalize_placement(&quotes));
        assert!(layers[0].degenerate);
        assert_eq!(layers[0].weighted_coverage, CoverageScore::ZERO);
        assert!(!layers[0].weighted_coverage.as_percent().is_nan());
        assert_eq!(layers[0].carrier_count, 0);
    }

    #[test]
    fn rating_buckets_follow_rank_table() {
        let placement = normalize_placement(&sample());
        let buckets = rating_distribution(&placement);
        let labels: Vec<&str> = buckets.iter().map(|b| b.rating.as_str()).collect();
        assert_eq!(labels, vec!["AA", "A"]);
        assert_eq!(buckets[0].quote_count, 3);
    }

    #[test]
    fn totals_and_diversity_ratio() {
        let report = PlacementReport::build(&sample());
        let expected: f64 = report.layers.iter().map(|l| l.total_capacity).sum();
        assert!((report.totals.total_capacity - expected).abs() < 1e-9);
        assert_eq!(report.totals.carriers_used, 3);

        let max = report.carriers.first().unwrap().total_capacity;
        let min = report.carriers.last().unwrap().total_capacity;
        assert!((report.totals.diversity_ratio.unwrap() - max / min).abs() < 1e-9);

        assert_eq!(report.book.quote_count, 6);
        assert_eq!(report.book.distinct_carriers, 4);
        assert_eq!(report.book.allocated_quotes, 5);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let quotes = sample();
        let a = serde_json::to_string(&PlacementReport::build(&quotes)).unwrap();
        let b = serde_json::to_string(&PlacementReport::build(&quotes)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn comparison_picks_cheapest_and_best_covered_options() {
        let option = |id: &str, quotes: Vec<QuoteRecord>| OptionSummary {
            option_id: id.to_string(),
            reported_premium: None,
            reported_coverage: None,
            rows_skipped: 0,
            report: PlacementReport::build(&quotes),
        };
        let comparison = OptionComparison {
            min_premium: None,
            max_premium: None,
            options: vec![
                option("0", vec![quote("AIG", LayerId::Primary, 2.0, 100.0, 0.6)]),
                option("1", vec![quote("Chubb", LayerId::Primary, 8.0, 100.0, 0.9)]),
                option("2", vec![quote("Zurich", LayerId::Primary, 2.0, 100.0, 0.6)]),
            ],
        };

        assert_eq!(comparison.cheapest().unwrap().option_id, "0");
        assert_eq!(comparison.best_covered().unwrap().option_id, "1");

        let empty = OptionComparison {
            min_premium: None,
            max_premium: None,
            options: Vec::new(),
        };
        assert!(empty.cheapest().is_none());
    }
}
