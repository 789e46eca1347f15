use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::shopping::ScaledIngredientOccurrence;

// ASCII digits only, at most one decimal point in the numeric token.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([0-9]+(?:\.[0-9]*)?|\.[0-9]+)\s*(.*)$").expect("valid quantity regex")
});

/// A quantity string split into its numeric prefix and unit suffix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuantity {
    pub value: Option<f64>,
    pub unit: String,
}

/// Split `"200g"` into `(200, "g")`.
///
/// Text without a leading number (`"适量"`) yields no value and keeps the whole
/// text as the unit, so it can only ever be compared verbatim.
#[must_use]
pub fn parse_quantity(text: &str) -> ParsedQuantity {
    if let Some(caps) = LEADING_NUMBER.captures(text) {
        if let Ok(value) = caps[1].parse::<f64>() {
            return ParsedQuantity {
                value: Some(value),
                unit: caps[2].trim().to_string(),
            };
        }
    }
    ParsedQuantity {
        value: None,
        unit: text.to_string(),
    }
}

/// Whole numbers print without a fraction, everything else with one decimal.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn format_amount(value: f64) -> String {
    if value % 1.0 == 0.0 {
        format!("{value}")
    } else {
        format!("{value:.1}")
    }
}

/// Result of merging the occurrences of one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityMerge<'a> {
    pub total: String,
    pub breakdown: &'a [ScaledIngredientOccurrence],
}

/// Sum the occurrences when every one is numeric and they share one unit
/// string exactly; otherwise join the occurrence texts with `" + "` in input
/// order. `breakdown` is always the input slice.
#[must_use]
pub fn merge_quantities(occurrences: &[ScaledIngredientOccurrence]) -> QuantityMerge<'_> {
    let parsed: Vec<ParsedQuantity> = occurrences
        .iter()
        .map(|o| parse_quantity(&o.quantity_text))
        .collect();

    let units: HashSet<&str> = parsed.iter().map(|p| p.unit.as_str()).collect();
    let all_numeric = parsed.iter().all(|p| p.value.is_some());

    let total = if all_numeric && units.len() == 1 {
        let sum: f64 = parsed.iter().filter_map(|p| p.value).sum();
        format!("{}{}", format_amount(sum), parsed[0].unit)
    } else {
        occurrences
            .iter()
            .map(|o| o.quantity_text.as_str())
            .collect::<Vec<_>>()
            .join(" + ")
    };

    QuantityMerge {
        total,
        breakdown: occurrences,
    }
}
