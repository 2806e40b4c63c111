//! Component codes: identifiers for the physical parts a measure touches.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one building element (`W1`, `D2`, `A1`, `HS`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentCode(pub String);

impl ComponentCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Whole-house pseudo component used by dwelling-wide measures.
pub const HOUSE: &str = "HOUSE";
/// Heating system.
pub const HEATING: &str = "HS";
/// Cooling system.
pub const COOLING: &str = "CS";
/// Distribution ducts.
pub const DUCTS: &str = "DUCT";
/// Water heater.
pub const WATER_HEATER: &str = "DHW";
/// Lighting.
pub const LIGHTING: &str = "LT";
/// Thermostat.
pub const THERMOSTAT: &str = "TSTAT";

/// Ordered set of component codes affected by one measure result.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSet(BTreeSet<ComponentCode>);

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(code: ComponentCode) -> Self {
        let mut set = Self::new();
        set.insert(code);
        set
    }

    /// Returns `true` if the code was not already present.
    pub fn insert(&mut self, code: ComponentCode) -> bool {
        self.0.insert(code)
    }

    pub fn contains(&self, code: &ComponentCode) -> bool {
        self.0.contains(code)
    }

    pub fn union(&self, other: &ComponentSet) -> ComponentSet {
        ComponentSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn is_disjoint(&self, other: &ComponentSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentCode> {
        self.0.iter()
    }
}

impl fmt::Display for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(ComponentCode::as_str).collect();
        f.write_str(&codes.join("+"))
    }
}

impl FromIterator<ComponentCode> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
