use serde::{Deserialize, Serialize};

/// Bases tried, in priority order, when the GCD of the observed values collapses to 1.
const COMMON_BASES: [u32; 4] = [4, 8, 6, 10];
const MIN_VALUES_FOR_COMMON_BASE: usize = 3;
const MIN_COMMON_BASE_COVERAGE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingScale {
    pub base_unit: u32,
    pub scale: Vec<u32>,
    pub coverage: f64,
}

impl SpacingScale {
    pub fn empty() -> Self {
        Self {
            base_unit: 1,
            scale: Vec::new(),
            coverage: 0.0,
        }
    }
}

/// Infer the base spacing unit from pixel values.
///
/// The GCD alone breaks on a single off-scale value, so when it degrades to 1 the
/// common design-system bases get a chance to explain most of the values instead.
pub fn detect_scale(values: &[f64]) -> SpacingScale {
    let rounded: Vec<u32> = values
        .iter()
        .map(|value| value.round())
        .filter(|value| value.is_finite() && *value > 0.0)
        .map(|value| value.min(f64::from(u32::MAX)) as u32)
        .collect();

    let Some((&first, rest)) = rounded.split_first() else {
        return SpacingScale::empty();
    };

    let mut base_unit = rest.iter().fold(first, |acc, &value| gcd(acc, value));

    if base_unit == 1 && rounded.len() > MIN_VALUES_FOR_COMMON_BASE {
        let mut best: Option<(u32, f64)> = None;
        for base in COMMON_BASES {
            let candidate = coverage(&rounded, base);
            if best.map_or(true, |(_, best_coverage)| candidate > best_coverage) {
                best = Some((base, candidate));
            }
        }
        if let Some((base, best_coverage)) = best {
            if best_coverage >= MIN_COMMON_BASE_COVERAGE {
                tracing::debug!(base, coverage = best_coverage, "adopted common spacing base");
                base_unit = base;
            }
        }
    }

    let mut scale: Vec<u32> = rounded
        .iter()
        .copied()
        .filter(|value| value % base_unit == 0)
        .collect();
    scale.sort_unstable();
    scale.dedup();

    SpacingScale {
        base_unit,
        scale,
        coverage: coverage(&rounded, base_unit),
    }
}

fn coverage(values: &[u32], base: u32) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let divisible = values.iter().filter(|value| *value % base == 0).count();
    divisible as f64 / values.len() as f64
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}
