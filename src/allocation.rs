//! Allocation normalization within a layer.
//!
//! The optimizer's per-layer allocation percentages can drift from an exact 100%
//! sum. `normalize_allocations` rescales one layer; `normalize_placement` does it
//! for a whole solution, over the quotes with `signed_capacity() > 0` only.

use tracing::debug;

use crate::domain::{LayerId, QuoteRecord};

/// Result of normalizing one layer's quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAllocation {
    /// Same quotes, same order, allocations rescaled to sum to 100.
    pub quotes: Vec<QuoteRecord>,
    /// Allocations summed to zero; `quotes` is the input unchanged.
    pub degenerate: bool,
}

/// Rescale allocation percentages so they sum to 100.
///
/// Callers pass the active quotes of a single layer. When the total is zero the
/// input comes back untouched with `degenerate = true`. Output order matches input.
pub fn normalize_allocations(quotes: &[QuoteRecord]) -> NormalizedAllocation {
    let total: f64 = quotes.iter().map(|q| q.allocation_percentage).sum();

    if total == 0.0 || !total.is_finite() {
        return NormalizedAllocation {
            quotes: quotes.to_vec(),
            degenerate: true,
        };
    }

    let quotes = quotes
        .iter()
        .map(|q| QuoteRecord {
            allocation_percentage: q.allocation_percentage / total * 100.0,
            ..q.clone()
        })
        .collect();

    NormalizedAllocation {
        quotes,
        degenerate: false,
    }
}

/// Per-layer facts gathered while normalizing a placement.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerAllocation {
    pub layer: LayerId,
    /// Every quote in the layer, active or not.
    pub quote_count: usize,
    /// Raw offered capacity, allocation ignored.
    pub offered_capacity: f64,
    pub degenerate: bool,
}

/// A solution after per-layer normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPlacement {
    /// Active quotes only, in input order. Capacity-bearing quotes carry
    /// normalized allocations; zero-offer quotes keep their reported ones.
    pub quotes: Vec<QuoteRecord>,
    /// One entry per layer present in the input, ordered by layer rank.
    pub layers: Vec<LayerAllocation>,
}

impl NormalizedPlacement {
    pub fn layer_quotes(&self, layer: LayerId) -> impl Iterator<Item = &QuoteRecord> {
        self.quotes.iter().filter(move |q| q.layer == layer)
    }
}

/// Normalize every layer of a solution.
///
/// Only quotes that carry capacity share a layer's 100%. An active quote with a
/// zero offer is kept at its reported allocation so it still counts as a layer
/// member; it adds nothing to capacity or premium sums.
pub fn normalize_placement(quotes: &[QuoteRecord]) -> NormalizedPlacement {
    let mut slots: Vec<Option<QuoteRecord>> = vec![None; quotes.len()];
    let mut layers = Vec::new();

    for layer in LayerId::ALL {
        let in_layer: Vec<usize> = (0..quotes.len())
            .filter(|&i| quotes[i].layer == layer)
            .collect();
        if in_layer.is_empty() {
            continue;
        }

        let (bearing, members): (Vec<usize>, Vec<usize>) = in_layer
            .iter()
            .copied()
            .filter(|&i| quotes[i].is_active())
            .partition(|&i| quotes[i].carries_capacity());

        let snapshot: Vec<QuoteRecord> = bearing.iter().map(|&i| quotes[i].clone()).collect();
        let normalized = normalize_allocations(&snapshot);

        if normalized.degenerate {
            debug!(layer = %layer, quotes = in_layer.len(), "layer has no allocated capacity");
        }

        for (&i, quote) in bearing.iter().zip(normalized.quotes) {
            slots[i] = Some(quote);
        }
        for &i in &members {
            slots[i] = Some(quotes[i].clone());
        }

        layers.push(LayerAllocation {
            layer,
            quote_count: in_layer.len(),
            offered_capacity: in_layer.iter().map(|&i| quotes[i].capacity).sum(),
            degenerate: normalized.degenerate,
        });
    }

    NormalizedPlacement {
        quotes: slots.into_iter().flatten().collect(),
        layers,
    }
}
