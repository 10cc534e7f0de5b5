//! Care-level and growth-information lookups by scientific name.
//!
//! These are coarse, hand-curated tables. The identification endpoint only
//! consults them when `detailed_care` is enabled; otherwise it reports the
//! fixed placeholder care level and whatever growth info the identification
//! service gave us.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Care level reported when no lookup is performed.
pub const PLACEHOLDER_CARE_LEVEL: &str = "Medium";

const EASY_GENERA: &[&str] = &[
    "Sansevieria",
    "Dracaena",
    "Zamioculcas",
    "Aspidistra",
    "Aglaonema",
];

const INTERMEDIATE_GENERA: &[&str] = &[
    "Monstera",
    "Ficus",
    "Calathea",
    "Philodendron",
    "Alocasia",
];

const DIFFICULT_GENERA: &[&str] = &["Orchidaceae", "Adiantum", "Dionaea", "Platycerium"];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GrowthInfo {
    pub soil_ph: Option<String>,
    pub light: Option<String>,
    pub atmospheric_humidity: Option<String>,
    pub soil_nutrient: Option<String>,
}

impl GrowthInfo {
    fn known(soil_ph: &str, light: &str, humidity: &str, nutrient: &str) -> Self {
        GrowthInfo {
            soil_ph: Some(soil_ph.to_owned()),
            light: Some(light.to_owned()),
            atmospheric_humidity: Some(humidity.to_owned()),
            soil_nutrient: Some(nutrient.to_owned()),
        }
    }

    /// Fill in any field that we don't have from `other`.
    pub fn or(self, other: GrowthInfo) -> Self {
        GrowthInfo {
            soil_ph: self.soil_ph.or(other.soil_ph),
            light: self.light.or(other.light),
            atmospheric_humidity: self.atmospheric_humidity.or(other.atmospheric_humidity),
            soil_nutrient: self.soil_nutrient.or(other.soil_nutrient),
        }
    }
}

static GROWTH_INFO_BY_SPECIES: Lazy<HashMap<&'static str, GrowthInfo>> = Lazy::new(|| {
    [
        (
            "Monstera deliciosa",
            GrowthInfo::known(
                "5.5-7.0 (slightly acidic to neutral)",
                "Bright, indirect light",
                "High humidity (50-60%)",
                "Rich, well-draining potting mix",
            ),
        ),
        (
            "Ficus lyrata",
            GrowthInfo::known(
                "6.0-7.0",
                "Bright, indirect light",
                "Medium to high (40-60%)",
                "Well-draining, rich potting mix",
            ),
        ),
        (
            "Dracaena trifasciata",
            GrowthInfo::known(
                "5.5-7.5",
                "Low to bright indirect light",
                "Low to average (30-40%)",
                "Well-draining, sandy soil",
            ),
        ),
    ]
    .into_iter()
    .collect()
});

/// Classify how demanding a plant is, by the genus or family named in its
/// scientific name.
pub fn determine_care_level(scientific_name: &str) -> &'static str {
    let tiers = [
        (EASY_GENERA, "Beginner-friendly"),
        (INTERMEDIATE_GENERA, "Intermediate"),
        (DIFFICULT_GENERA, "Advanced"),
    ];

    for (genera, level) in tiers {
        if genera.iter().any(|g| scientific_name.contains(g)) {
            return level;
        }
    }

    "Intermediate"
}

/// Growth info for an exact species, else for any known species of the same
/// genus, else generic houseplant advice.
pub fn growth_info_for(scientific_name: &str) -> GrowthInfo {
    if let Some(info) = GROWTH_INFO_BY_SPECIES.get(scientific_name) {
        return info.clone();
    }

    let genus = scientific_name.split(' ').next().unwrap_or_default();

    // Sorted so that the answer doesn't depend on hash order.
    let mut species: Vec<_> = GROWTH_INFO_BY_SPECIES.iter().collect();
    species.sort_by_key(|(name, _)| *name);

    for (name, info) in species {
        if name.split(' ').next() == Some(genus) {
            return info.clone();
        }
    }

    GrowthInfo::known(
        "6.0-7.0 (neutral)",
        "Medium to bright indirect light",
        "Average humidity (40-50%)",
        "Standard potting mix with good drainage",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn care_levels() {
        assert_eq!(determine_care_level("Sansevieria trifasciata"), "Beginner-friendly");
        assert_eq!(determine_care_level("Monstera deliciosa"), "Intermediate");
        assert_eq!(determine_care_level("Dionaea muscipula"), "Advanced");
        assert_eq!(determine_care_level("Solanum lycopersicum"), "Intermediate");
    }

    #[test]
    fn growth_info_lookup_order() {
        let exact = growth_info_for("Ficus lyrata");
        assert_eq!(exact.soil_ph.as_deref(), Some("6.0-7.0"));

        let genus = growth_info_for("Monstera adansonii");
        assert_eq!(genus.light.as_deref(), Some("Bright, indirect light"));
        assert_eq!(genus.atmospheric_humidity.as_deref(), Some("High humidity (50-60%)"));

        let fallback = growth_info_for("Solanum lycopersicum");
        assert_eq!(fallback.soil_ph.as_deref(), Some("6.0-7.0 (neutral)"));
    }

    #[test]
    fn merging_prefers_existing_values() {
        let partial = GrowthInfo {
            light: Some("full sun".to_owned()),
            ..Default::default()
        };
        let merged = partial.or(growth_info_for("Ficus lyrata"));
        assert_eq!(merged.light.as_deref(), Some("full sun"));
        assert_eq!(merged.soil_ph.as_deref(), Some("6.0-7.0"));
    }
}
