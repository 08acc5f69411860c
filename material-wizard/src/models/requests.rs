// API request models
// Body POSTed to `/api/materials`. Absent values are omitted, never sent as null.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::draft::{EntryType, FinishingDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    /// Actual unit cost supplied.
    Provided,
    /// Only an estimated unit cost supplied.
    Estimated,
    /// No cost information at all.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPayload {
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub phase_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,

    pub quantity: f64,
    pub unit: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_unit_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_received_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retroactive_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finishing_details: Option<FinishingDetails>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_note_file_url: Option<String>,

    pub entry_type: EntryType,
    pub is_retroactive_entry: bool,
    pub cost_status: CostStatus,
}
