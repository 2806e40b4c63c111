//! Priority tiers and reporting package groups.

use std::fmt;

use serde::Serialize;

use crate::dwelling::ItemizedCategory;
use crate::error::EngineError;
use crate::measures::MeasureKind;

/// Ordering class of a measure result in the final report.
///
/// Declaration order is report order: the derived `Ord` ranks `Required`
/// first and `NotCostEffective` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    /// Mandated by the auditor.
    Required,
    /// Itemized health and safety work without declared savings.
    HealthAndSafety,
    /// Equipment that must be replaced (e.g. red-tagged furnace).
    MandatoryEquipment,
    InfiltrationReduction,
    DuctSealing,
    /// SIR at or above the configured minimum.
    CostEffective,
    /// User-itemized cost that declares energy savings.
    ItemizedWithSavings,
    /// Itemized repair without declared savings.
    IncidentalRepair,
    /// SIR below the configured minimum.
    NotCostEffective,
}

impl PriorityTier {
    /// Tiers admitted to the cumulative pass regardless of SIR.
    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            PriorityTier::Required
                | PriorityTier::HealthAndSafety
                | PriorityTier::MandatoryEquipment
                | PriorityTier::IncidentalRepair
        )
    }

    pub fn key(self) -> &'static str {
        match self {
            PriorityTier::Required => "required",
            PriorityTier::HealthAndSafety => "health_and_safety",
            PriorityTier::MandatoryEquipment => "mandatory_equipment",
            PriorityTier::InfiltrationReduction => "infiltration_reduction",
            PriorityTier::DuctSealing => "duct_sealing",
            PriorityTier::CostEffective => "cost_effective",
            PriorityTier::ItemizedWithSavings => "itemized_with_savings",
            PriorityTier::IncidentalRepair => "incidental_repair",
            PriorityTier::NotCostEffective => "not_cost_effective",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Coarse reporting group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageGroup {
    HealthAndSafety,
    EnergySavings,
    IncidentalRepair,
}

impl fmt::Display for PackageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageGroup::HealthAndSafety => "health_and_safety",
            PackageGroup::EnergySavings => "energy_savings",
            PackageGroup::IncidentalRepair => "incidental_repair",
        };
        f.write_str(s)
    }
}

/// What kind of measure is being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureClass {
    /// A catalog measure ranked by SIR unless something elevates it.
    Standard(MeasureKind),
    /// A catalog measure that must be done (unsafe or failed equipment).
    MandatoryEquipment(MeasureKind),
    /// A user-itemized cost.
    Itemized {
        category: ItemizedCategory,
        declares_savings: bool,
    },
}

/// Assigns the priority tier of one measure result.
///
/// Itemized costs are classified by whether they declare savings and then by
/// category; the required flag does not apply to them.
pub fn classify_priority(
    class: MeasureClass,
    required: bool,
    sir: f64,
    minimum_sir: f64,
) -> PriorityTier {
    match class {
        MeasureClass::Itemized {
            declares_savings: true,
            ..
        } => PriorityTier::ItemizedWithSavings,
        MeasureClass::Itemized { category, .. } => match category {
            ItemizedCategory::HealthAndSafety => PriorityTier::HealthAndSafety,
            ItemizedCategory::IncidentalRepair | ItemizedCategory::Energy => {
                PriorityTier::IncidentalRepair
            }
        },
        _ if required => PriorityTier::Required,
        MeasureClass::MandatoryEquipment(_) => PriorityTier::MandatoryEquipment,
        MeasureClass::Standard(MeasureKind::DuctSealing) => PriorityTier::DuctSealing,
        MeasureClass::Standard(MeasureKind::InfiltrationReduction) => {
            PriorityTier::InfiltrationReduction
        }
        MeasureClass::Standard(_) if sir >= minimum_sir => PriorityTier::CostEffective,
        MeasureClass::Standard(_) => PriorityTier::NotCostEffective,
    }
}

/// Whether a result with this tier and SIR is carried into (or kept in) the
/// cumulative package.
pub fn is_admitted(tier: PriorityTier, sir: f64, minimum_sir: f64) -> bool {
    tier.is_mandatory() || sir >= minimum_sir
}

/// Reporting group of a tier.
///
/// # Errors
///
/// Returns [`EngineError::UnmappedTier`] for `NotCostEffective`, which never
/// appears in a package.
pub fn package_group(tier: PriorityTier) -> Result<PackageGroup, EngineError> {
    match tier {
        PriorityTier::HealthAndSafety => Ok(PackageGroup::HealthAndSafety),
        PriorityTier::IncidentalRepair => Ok(PackageGroup::IncidentalRepair),
        PriorityTier::Required
        | PriorityTier::MandatoryEquipment
        | PriorityTier::InfiltrationReduction
        | PriorityTier::DuctSealing
        | PriorityTier::CostEffective
        | PriorityTier::ItemizedWithSavings => Ok(PackageGroup::EnergySavings),
        PriorityTier::NotCostEffective => Err(EngineError::UnmappedTier {
            tier: tier.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STD: MeasureClass = MeasureClass::Standard(MeasureKind::AtticInsulation);

    #[test]
    fn standard_measures_rank_by_sir() {
        assert_eq!(classify_priority(STD, false, 1.5, 1.0), PriorityTier::CostEffective);
        assert_eq!(classify_priority(STD, false, 1.0, 1.0), PriorityTier::CostEffective);
        assert_eq!(
            classify_priority(STD, false, 0.25, 1.0),
            PriorityTier::NotCostEffective
        );
    }

    #[test]
    fn required_beats_sir() {
        let tier = classify_priority(STD, true, 0.1, 1.0);
        assert_eq!(tier, PriorityTier::Required);
        assert!(is_admitted(tier, 0.1, 1.0));
    }

    #[test]
    fn duct_and_infiltration_get_fixed_tiers() {
        let duct = MeasureClass::Standard(MeasureKind::DuctSealing);
        let air = MeasureClass::Standard(MeasureKind::InfiltrationReduction);
        assert_eq!(classify_priority(duct, false, 0.2, 1.0), PriorityTier::DuctSealing);
        assert_eq!(
            classify_priority(air, false, 5.0, 1.0),
            PriorityTier::InfiltrationReduction
        );
        assert!(!is_admitted(PriorityTier::DuctSealing, 0.2, 1.0));
    }

    #[test]
    fn red_tagged_equipment_is_mandatory() {
        let class = MeasureClass::MandatoryEquipment(MeasureKind::HeatingReplacement);
        let tier = classify_priority(class, false, 0.3, 1.0);
        assert_eq!(tier, PriorityTier::MandatoryEquipment);
        assert!(is_admitted(tier, 0.3, 1.0));
    }

    #[test]
    fn itemized_tiers_depend_on_declared_savings() {
        let with = MeasureClass::Itemized {
            category: ItemizedCategory::HealthAndSafety,
            declares_savings: true,
        };
        let hs = MeasureClass::Itemized {
            category: ItemizedCategory::HealthAndSafety,
            declares_savings: false,
        };
        let repair = MeasureClass::Itemized {
            category: ItemizedCategory::IncidentalRepair,
            declares_savings: false,
        };
        assert_eq!(classify_priority(with, true, 0.5, 1.0), PriorityTier::ItemizedWithSavings);
        assert_eq!(classify_priority(hs, false, 0.0, 1.0), PriorityTier::HealthAndSafety);
        assert_eq!(classify_priority(repair, false, 0.0, 1.0), PriorityTier::IncidentalRepair);
    }

    #[test]
    fn tier_order_puts_required_first() {
        assert!(PriorityTier::Required < PriorityTier::CostEffective);
        assert!(PriorityTier::CostEffective < PriorityTier::NotCostEffective);
    }

    #[test]
    fn package_groups() {
        assert_eq!(
            package_group(PriorityTier::HealthAndSafety).unwrap(),
            PackageGroup::HealthAndSafety
        );
        assert_eq!(
            package_group(PriorityTier::DuctSealing).unwrap(),
            PackageGroup::EnergySavings
        );
        assert!(matches!(
            package_group(PriorityTier::NotCostEffective),
            Err(EngineError::UnmappedTier { .. })
        ));
    }
}
