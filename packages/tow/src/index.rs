//! Per-plate case lookup for joining against fine aggregates.

use std::collections::HashMap;

use scofftow_fines_models::PlateKey;
use scofftow_tow_models::TowCase;

/// The first case seen for each plate key.
///
/// A plate may have several cases; joins against plate aggregates only
/// use the first one in input order so that each plate maps to at most
/// one case.
#[derive(Debug, Clone, Default)]
pub struct CaseIndex {
    cases: HashMap<PlateKey, TowCase>,
}

impl CaseIndex {
    /// Builds the index, keeping the first case per plate key.
    #[must_use]
    pub fn first_per_plate(cases: impl IntoIterator<Item = TowCase>) -> Self {
        let mut index: HashMap<PlateKey, TowCase> = HashMap::new();
        for case in cases {
            index.entry(case.key.clone()).or_insert(case);
        }
        Self { cases: index }
    }

    /// Looks up the case for a plate.
    #[must_use]
    pub fn get(&self, key: &PlateKey) -> Option<&TowCase> {
        self.cases.get(key)
    }

    /// Number of distinct plates with a case.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
