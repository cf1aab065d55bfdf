//! Alloy composition parsing and validation.
//!
//! A composition arrives from the caller as a list of `{symbol, weight}`
//! entries and is stored as a fixed-length weight-% array indexed per
//! [`crate::periodic`]. Parsing fails on unknown symbols, duplicates, and
//! missing required elements; the iron weight is always re-derived as
//! `100 - sum(other weights)` rather than trusted from the input.

use crate::errors::{PhasekinError, PhasekinResult};
use crate::periodic;
use serde::{Deserialize, Serialize};

/// One raw composition entry as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementEntry {
    pub symbol: String,
    pub weight: f64,
}

/// Weight-% makeup of one alloy.
///
/// Immutable once handed to a solve call; the equilibrium solver takes an
/// owned copy per call because it rewrites the C and Fe slots in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlloyComposition {
    weights: [f64; periodic::NUM_ELEMENTS],
}

impl AlloyComposition {
    /// Parse and validate a list of `{symbol, weight}` entries.
    pub fn from_entries(entries: &[ElementEntry]) -> PhasekinResult<Self> {
        let mut weights = [0.0_f64; periodic::NUM_ELEMENTS];
        let mut seen = [false; periodic::NUM_ELEMENTS];

        for entry in entries {
            let index = periodic::index_of(&entry.symbol)
                .ok_or_else(|| PhasekinError::UnknownElement(entry.symbol.clone()))?;
            if seen[index] {
                return Err(PhasekinError::DuplicateElement(entry.symbol.clone()));
            }
            if !entry.weight.is_finite() || entry.weight < 0.0 || entry.weight > 100.0 {
                return Err(PhasekinError::Configuration(format!(
                    "weight for {} must be in [0, 100], got {}",
                    entry.symbol, entry.weight
                )));
            }
            seen[index] = true;
            weights[index] = entry.weight;
        }

        let missing: Vec<String> = periodic::REQUIRED
            .iter()
            .filter(|&&i| !seen[i])
            .map(|&i| periodic::symbol(i).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PhasekinError::MissingElements(missing));
        }

        let mut comp = Self { weights };
        comp.rebalance_iron()?;
        Ok(comp)
    }

    /// Weight % of the element at `index`.
    pub fn weight(&self, index: usize) -> f64 {
        self.weights[index]
    }

    /// Carbon weight %.
    pub fn carbon(&self) -> f64 {
        self.weights[periodic::CARBON]
    }

    /// Overwrite one slot. Only the equilibrium solver uses this, on its
    /// own per-call copy.
    pub(crate) fn set_weight(&mut self, index: usize, value: f64) {
        self.weights[index] = value;
    }

    /// Recompute the iron slot by difference to 100 wt%.
    pub(crate) fn rebalance_iron(&mut self) -> PhasekinResult<()> {
        self.weights[periodic::IRON] = 0.0;
        let others: f64 = self.weights.iter().sum();
        if others >= 100.0 {
            return Err(PhasekinError::Configuration(format!(
                "alloying elements sum to {} wt%, leaving no iron",
                others
            )));
        }
        self.weights[periodic::IRON] = 100.0 - others;
        Ok(())
    }

    /// Iterate over `(index, weight)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.weights.iter().copied().enumerate()
    }
}

/// The required entry set with every weight zero except the overrides given.
/// Test construction helper shared across the crate's unit tests.
#[cfg(test)]
pub(crate) fn base_entries(overrides: &[(&str, f64)]) -> Vec<ElementEntry> {
    let mut entries: Vec<ElementEntry> = periodic::REQUIRED
        .iter()
        .map(|&i| ElementEntry {
            symbol: periodic::symbol(i).to_string(),
            weight: 0.0,
        })
        .collect();
    for (symbol, weight) in overrides {
        match entries.iter_mut().find(|e| e.symbol == *symbol) {
            Some(e) => e.weight = *weight,
            None => entries.push(ElementEntry {
                symbol: symbol.to_string(),
                weight: *weight,
            }),
        }
    }
    entries
}

/// The alloy the golden-value fixtures use: C 0.044, Mn 1.73, Si 0.22, Mo 0.26.
#[cfg(test)]
pub(crate) fn reference_alloy() -> AlloyComposition {
    AlloyComposition::from_entries(&base_entries(&[
        ("C", 0.044),
        ("Mn", 1.73),
        ("Si", 0.22),
        ("Mo", 0.26),
    ]))
    .expect("reference alloy is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, weight: f64) -> ElementEntry {
        ElementEntry {
            symbol: symbol.to_string(),
            weight,
        }
    }

    #[test]
    fn parses_the_reference_alloy() {
        let comp = AlloyComposition::from_entries(&base_entries(&[
            ("C", 0.044),
            ("Mn", 1.73),
            ("Si", 0.22),
            ("Mo", 0.26),
        ]))
        .unwrap();
        assert_eq!(comp.carbon(), 0.044);
        assert_eq!(comp.weight(periodic::MANGANESE), 1.73);
        // iron derived by difference, regardless of the supplied Fe entry
        let expected_fe = 100.0 - (0.044 + 1.73 + 0.22 + 0.26);
        assert!((comp.weight(periodic::IRON) - expected_fe).abs() < 1e-12);
    }

    #[test]
    fn supplied_iron_weight_is_ignored() {
        let mut entries = base_entries(&[("C", 0.1)]);
        entries.iter_mut().find(|e| e.symbol == "Fe").unwrap().weight = 42.0;
        let comp = AlloyComposition::from_entries(&entries).unwrap();
        assert!((comp.weight(periodic::IRON) - 99.9).abs() < 1e-12);
    }

    #[test]
    fn unknown_element_fails() {
        let mut entries = base_entries(&[]);
        entries.push(entry("Zz", 0.5));
        let err = AlloyComposition::from_entries(&entries).unwrap_err();
        assert!(matches!(err, PhasekinError::UnknownElement(s) if s == "Zz"));
    }

    #[test]
    fn duplicate_element_fails() {
        let mut entries = base_entries(&[("C", 0.1)]);
        entries.push(entry("C", 0.2));
        let err = AlloyComposition::from_entries(&entries).unwrap_err();
        assert!(matches!(err, PhasekinError::DuplicateElement(s) if s == "C"));
    }

    #[test]
    fn missing_elements_are_all_reported() {
        let entries = vec![entry("C", 0.1), entry("Mn", 0.5)];
        let err = AlloyComposition::from_entries(&entries).unwrap_err();
        match err {
            PhasekinError::MissingElements(missing) => {
                assert_eq!(
                    missing,
                    vec!["Ni", "Cr", "Mo", "Si", "Co", "W", "As", "Fe"],
                    "every absent required element should be listed"
                );
            }
            other => panic!("expected MissingElements, got {:?}", other),
        }
    }

    #[test]
    fn negative_weight_fails() {
        let err =
            AlloyComposition::from_entries(&base_entries(&[("C", -0.1)])).unwrap_err();
        assert!(matches!(err, PhasekinError::Configuration(_)));
    }

    #[test]
    fn overfull_alloy_fails() {
        let err = AlloyComposition::from_entries(&base_entries(&[
            ("Mn", 60.0),
            ("Ni", 45.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, PhasekinError::Configuration(_)));
    }
}
