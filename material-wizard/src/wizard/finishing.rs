//! Finishing-category sub-forms.
//!
//! Some categories (electrical, plumbing, joinery, paintwork, tiling, lift installation) carry
//! extra structured details. The category name is matched case-insensitively by substring and
//! the matched kind decides which fields the sub-form shows.

use crate::models::draft::FinishingDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishingField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
}

const fn field(key: &'static str, label: &'static str, required: bool) -> FinishingField {
    FinishingField {
        key,
        label,
        required,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishingKind {
    Electrical,
    Plumbing,
    Joinery,
    Paintwork,
    Tiling,
    LiftInstallation,
}

const ALL_KINDS: [FinishingKind; 6] = [
    FinishingKind::Electrical,
    FinishingKind::Plumbing,
    FinishingKind::Joinery,
    FinishingKind::Paintwork,
    FinishingKind::Tiling,
    FinishingKind::LiftInstallation,
];

const ELECTRICAL_FIELDS: &[FinishingField] = &[
    field("brand", "Brand", true),
    field("technicianName", "Technician name", true),
    field("specification", "Specification", false),
    field("warrantyPeriod", "Warranty period", false),
];

const PLUMBING_FIELDS: &[FinishingField] = &[
    field("brand", "Brand", true),
    field("plumberName", "Plumber name", true),
    field("pipeSize", "Pipe size", false),
    field("fixtureType", "Fixture type", false),
];

const JOINERY_FIELDS: &[FinishingField] = &[
    field("woodType", "Wood type", true),
    field("carpenterName", "Carpenter name", true),
    field("finish", "Finish", false),
    field("dimensions", "Dimensions", false),
];

const PAINTWORK_FIELDS: &[FinishingField] = &[
    field("paintType", "Paint type", true),
    field("colour", "Colour", true),
    field("brand", "Brand", false),
    field("coats", "Number of coats", false),
];

const TILING_FIELDS: &[FinishingField] = &[
    field("tileType", "Tile type", true),
    field("squareMeters", "Square meters", true),
    field("supplier", "Tile supplier", true),
    field("tileSize", "Tile size", false),
];

const LIFT_FIELDS: &[FinishingField] = &[
    field("manufacturer", "Manufacturer", true),
    field("model", "Model", true),
    field("installerName", "Installer name", true),
    field("capacityKg", "Capacity (kg)", false),
];

impl FinishingKind {
    /// Match a category name against the finishing set. First match wins.
    pub fn detect(category_name: &str) -> Option<Self> {
        let lowered = category_name.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.keywords().iter().any(|k| lowered.contains(k)))
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            FinishingKind::Electrical => &["electrical"],
            FinishingKind::Plumbing => &["plumbing"],
            FinishingKind::Joinery => &["joinery", "carpentry"],
            FinishingKind::Paintwork => &["paintwork", "painting"],
            FinishingKind::Tiling => &["tiling", "terrazzo"],
            FinishingKind::LiftInstallation => &["lift installation", "lift"],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FinishingKind::Electrical => "Electrical details",
            FinishingKind::Plumbing => "Plumbing details",
            FinishingKind::Joinery => "Joinery / carpentry details",
            FinishingKind::Paintwork => "Paintwork details",
            FinishingKind::Tiling => "Tiling / terrazzo details",
            FinishingKind::LiftInstallation => "Lift installation details",
        }
    }

    pub fn fields(&self) -> &'static [FinishingField] {
        match self {
            FinishingKind::Electrical => ELECTRICAL_FIELDS,
            FinishingKind::Plumbing => PLUMBING_FIELDS,
            FinishingKind::Joinery => JOINERY_FIELDS,
            FinishingKind::Paintwork => PAINTWORK_FIELDS,
            FinishingKind::Tiling => TILING_FIELDS,
            FinishingKind::LiftInstallation => LIFT_FIELDS,
        }
    }

    /// Labels of required fields that are still blank. Advisory only.
    pub fn missing_required(&self, details: &FinishingDetails) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|f| f.required)
            .filter(|f| {
                details
                    .get(f.key)
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|f| f.label)
            .collect()
    }
}

/// True when at least one value is non-blank.
pub fn has_content(details: &FinishingDetails) -> bool {
    details.values().any(|v| !v.trim().is_empty())
}

/// Copy of `details` without blank values, trimmed.
pub fn compact(details: &FinishingDetails) -> FinishingDetails {
    details
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (k.clone(), v.trim().to_string()))
        .collect()
}
