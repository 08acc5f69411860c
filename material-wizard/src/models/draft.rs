// In-memory material draft
//
// NOTE: The draft is never persisted. It is created empty when the wizard starts, filled in
// step by step, and dropped after a successful submit or when the wizard exits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit value that switches the wizard to the free-text custom unit field.
pub const OTHERS_UNIT: &str = "others";

/// Units offered on step 2. `others` must stay last.
pub const UNITS: &[&str] = &[
    "piece", "bag", "kg", "tonne", "litre", "gallon", "m", "m2", "m3", "roll", "sheet", "bundle",
    "box", "set", "length", "trip", "load", OTHERS_UNIT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    NewPurchase,
    RetroactiveEntry,
}

impl EntryType {
    pub fn as_id(&self) -> &'static str {
        match self {
            EntryType::NewPurchase => "new_purchase",
            EntryType::RetroactiveEntry => "retroactive_entry",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryType::NewPurchase => "New purchase (request approval first)",
            EntryType::RetroactiveEntry => "Retroactive entry (already on site)",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            EntryType::NewPurchase => EntryType::RetroactiveEntry,
            EntryType::RetroactiveEntry => EntryType::NewPurchase,
        }
    }
}

/// Category-specific extra fields, keyed by camelCase field key. Setters merge into the map.
pub type FinishingDetails = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDraft {
    // Step 1: context
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub category_id: String,
    pub phase_id: String,
    pub floor: Option<String>,

    // Step 2: quantity
    pub quantity: Option<f64>,
    pub unit: String,
    pub custom_unit: String,

    // Step 3: cost, supplier, retroactive metadata
    pub unit_cost: Option<f64>,
    pub estimated_unit_cost: Option<f64>,
    pub supplier_name: String,
    pub purchase_date: Option<NaiveDate>,
    pub material_received_by: String,
    pub retroactive_notes: String,
    pub finishing_details: FinishingDetails,

    // Step 4: documents (URLs produced by the upload service)
    pub receipt_file_url: Option<String>,
    pub invoice_file_url: Option<String>,
    pub delivery_note_file_url: Option<String>,
}

impl MaterialDraft {
    pub fn is_custom_unit(&self) -> bool {
        self.unit.trim() == OTHERS_UNIT
    }

    /// Unit as it should be sent: the trimmed custom unit for `others`, else the trimmed unit.
    pub fn resolved_unit(&self) -> String {
        if self.is_custom_unit() {
            self.custom_unit.trim().to_string()
        } else {
            self.unit.trim().to_string()
        }
    }

    /// Cost used for totals: the actual unit cost, falling back to the estimate.
    pub fn effective_unit_cost(&self) -> Option<f64> {
        self.unit_cost.or(self.estimated_unit_cost)
    }
}
