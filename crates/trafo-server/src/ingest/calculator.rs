//! Derived power quantities for a single reading
//!
//! Per phase: `kVA = V * I`, `kW = kVA * cosphi`, `kvar = kVA * sin(phi)` with
//! `sin(phi) = sqrt(1 - cosphi^2)`. Totals sum the three phases and remaining
//! capacity is `rated_capacity - total_kVA`.
//!
//! A quantity is `None` whenever any of its inputs is. Totals require all
//! three phases. A power factor outside `[-1, 1]` has no sine, so reactive
//! power is dropped for that reading while apparent and real power are kept.

use trafo_common::types::PhaseValues;

use super::models::{DerivedMetrics, NormalizedReading};

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `sqrt(1 - cosphi^2)`, or `None` when `|cosphi| > 1`
pub fn sin_phi(cosphi: f64) -> Option<f64> {
    if cosphi.abs() > 1.0 {
        return None;
    }
    finite((1.0 - cosphi * cosphi).sqrt())
}

pub fn derive(reading: &NormalizedReading, rated_capacity: f64) -> DerivedMetrics {
    let kva = reading
        .voltage
        .zip_with(&reading.current, |v, i| finite(v * i));

    let (kw, kvar) = match reading.cosphi {
        Some(cosphi) => (
            kva.map(|s| finite(s * cosphi)),
            match sin_phi(cosphi) {
                Some(sin) => kva.map(|s| finite(s * sin)),
                None => PhaseValues::default(),
            },
        ),
        None => (PhaseValues::default(), PhaseValues::default()),
    };

    let total_kva = kva.total().and_then(finite);
    let remaining_capacity = total_kva.and_then(|total| finite(rated_capacity - total));

    DerivedMetrics {
        kva,
        kw,
        kvar,
        total_kva,
        total_kw: kw.total().and_then(finite),
        total_kvar: kvar.total().and_then(finite),
        remaining_capacity,
    }
}
