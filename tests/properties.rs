//! Property-based tests for the allocation and aggregation invariants.

use proptest::prelude::*;

use placement_engine::allocation::{NormalizedPlacement, normalize_allocations, normalize_placement};
use placement_engine::domain::{CoverageScore, LayerField, LayerId, QuoteRecord};
use placement_engine::report::{PlacementReport, summarize_carriers, summarize_layers};
use placement_engine::scores::Decomposer;
use placement_engine::weights::ImportanceLevel;

fn layer() -> impl Strategy<Value = LayerId> {
    prop::sample::select(LayerId::ALL.to_vec())
}

fn carrier() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["AIG", "Chubb", "Zurich", "Travelers", "Beazley"])
}

/// Allocation percentages, with a fair share of exact zeros.
fn allocation() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.01f64..100.0]
}

/// Offered capacity in $M, sometimes exactly zero.
fn capacity() -> impl Strategy<Value = f64> {
    prop_oneof![1 => Just(0.0), 3 => 0.0f64..50.0]
}

fn quote() -> impl Strategy<Value = QuoteRecord> {
    (carrier(), layer(), 0.0f64..2_000_000.0, capacity(), allocation(), 0.0f64..=1.0).prop_map(
        |(carrier, layer, premium, capacity, pct, coverage)| {
            QuoteRecord::new(
                carrier,
                layer,
                premium,
                capacity,
                pct,
                CoverageScore::from_fraction(coverage),
            )
            .expect("strategy only yields valid quotes")
        },
    )
}

fn quotes() -> impl Strategy<Value = Vec<QuoteRecord>> {
    prop::collection::vec(quote(), 0..40)
}

proptest! {
    /// Property: in every non-degenerate layer the quotes with positive signed
    /// capacity sum to 100 after normalization.
    #[test]
    fn prop_layer_allocations_sum_to_100(quotes in quotes()) {
        let placement = normalize_placement(&quotes);
        for alloc in placement.layers.iter().filter(|l| !l.degenerate) {
            let sum: f64 = placement
                .layer_quotes(alloc.layer)
                .filter(|q| q.signed_capacity() > 0.0)
                .map(|q| q.allocation_percentage)
                .sum();
            prop_assert!((sum - 100.0).abs() < 1e-6, "layer {} sums to {sum}", alloc.layer);
        }
    }

    /// Property: adding zero-capacity quotes to a layer leaves the
    /// capacity-bearing allocations where they were.
    #[test]
    fn prop_zero_capacity_quotes_take_no_share(
        quotes in prop::collection::vec(quote(), 1..20),
        extra in prop::collection::vec((carrier(), 0.01f64..100.0), 1..5),
        target in layer(),
    ) {
        let mut bearing = quotes;
        for q in &mut bearing {
            q.layer = target;
            if q.capacity == 0.0 {
                q.capacity = 1.0;
            }
        }
        let mut mixed = bearing.clone();
        for (carrier, pct) in extra {
            mixed.push(
                QuoteRecord::new(carrier, target, 0.0, 0.0, pct, CoverageScore::ZERO)
                    .expect("strategy only yields valid quotes"),
            );
        }

        let alone = normalize_placement(&bearing);
        let with_members = normalize_placement(&mixed);
        prop_assert_eq!(alone.layers[0].degenerate, with_members.layers[0].degenerate);

        let shares = |p: &NormalizedPlacement| -> Vec<f64> {
            p.quotes
                .iter()
                .filter(|q| q.carries_capacity())
                .map(|q| q.allocation_percentage)
                .collect()
        };
        let (a, b) = (shares(&alone), shares(&with_members));
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            prop_assert!((x - y).abs() < 1e-9);
        }
    }

    /// Property: normalizing twice equals normalizing once.
    #[test]
    fn prop_normalizer_is_idempotent(quotes in prop::collection::vec(quote(), 1..20)) {
        let once = normalize_allocations(&quotes).quotes;
        let twice = normalize_allocations(&once).quotes;
        prop_assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            prop_assert!((a.allocation_percentage - b.allocation_percentage).abs() < 1e-9);
        }
    }

    /// Property: an all-zero layer is returned unchanged and aggregates to zero coverage.
    #[test]
    fn prop_zero_allocation_layer_is_safe(
        mut quotes in prop::collection::vec(quote(), 1..10),
        target in layer(),
    ) {
        for q in &mut quotes {
            q.allocation_percentage = 0.0;
            q.layer = target;
        }

        let out = normalize_allocations(&quotes);
        prop_assert!(out.degenerate);
        prop_assert_eq!(&out.quotes, &quotes);

        let layers = summarize_layers(&normalize_placement(&quotes));
        prop_assert_eq!(layers.len(), 1);
        prop_assert_eq!(layers[0].weighted_coverage, CoverageScore::ZERO);
        prop_assert_eq!(layers[0].total_capacity, 0.0);
    }

    /// Property: aggregation output is a pure function of its input.
    #[test]
    fn prop_aggregation_is_deterministic(quotes in quotes()) {
        let first = serde_json::to_string(&PlacementReport::build(&quotes)).unwrap();
        let second = serde_json::to_string(&PlacementReport::build(&quotes)).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: coverage is never NaN and always stays on the 0-100 scale.
    #[test]
    fn prop_weighted_coverage_is_bounded(quotes in quotes()) {
        let placement = normalize_placement(&quotes);
        for l in summarize_layers(&placement) {
            let pct = l.weighted_coverage.as_percent();
            prop_assert!(pct.is_finite());
            prop_assert!((-1e-9..=100.0 + 1e-9).contains(&pct));
        }
        for c in summarize_carriers(&placement) {
            prop_assert!(c.weighted_coverage.as_percent().is_finite());
            prop_assert!(!c.layers.is_empty());
        }
    }

    /// Property: layer totals and carrier totals describe the same capacity.
    #[test]
    fn prop_layer_and_carrier_totals_agree(quotes in quotes()) {
        let placement = normalize_placement(&quotes);
        let by_layer: f64 = summarize_layers(&placement).iter().map(|l| l.total_capacity).sum();
        let by_carrier: f64 = summarize_carriers(&placement).iter().map(|c| c.total_capacity).sum();
        prop_assert!((by_layer - by_carrier).abs() < 1e-6 * by_layer.max(1.0));
    }

    /// Property: the decomposer never leaves the layer empty.
    #[test]
    fn prop_decomposer_always_yields_a_layer(
        raw in "\\PC{0,40}",
        explicit in prop::option::of(prop_oneof![
            (0u32..50).prop_map(|n| LayerField::Number(f64::from(n))),
            "\\PC{0,12}".prop_map(LayerField::Text),
        ]),
    ) {
        let pair = Decomposer::default().decompose(&raw, explicit.as_ref());
        prop_assert!(!pair.layer.trim().is_empty());
    }

    /// Property: every valid importance level maps into the documented weight range.
    #[test]
    fn prop_weights_stay_in_range(level in 0i64..=4) {
        let w = ImportanceLevel::try_from(level).unwrap().weight();
        prop_assert!((0.01..=0.26 + 1e-12).contains(&w));
    }
}
