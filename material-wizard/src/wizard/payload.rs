// Submit payload assembly
//
// Turns the wizard state into the `/api/materials` body. Validation is re-run here so a payload
// can never be built from a draft that skipped the step gate.

use crate::error::ValidationError;
use crate::models::draft::{EntryType, MaterialDraft};
use crate::models::requests::{CostStatus, MaterialPayload};
use crate::models::responses::Category;
use crate::wizard::finishing::{self, FinishingKind};
use crate::wizard::state::{validate_for_submit, WizardState};

/// Category name for the draft: the stored name, else a lookup of `category_id`.
pub fn resolve_category_name(draft: &MaterialDraft, categories: &[Category]) -> Option<String> {
    let name = draft.category.trim();
    if !name.is_empty() {
        return Some(name.to_string());
    }
    let id = draft.category_id.trim();
    if id.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Finishing kind for the draft's category, if any.
pub fn finishing_kind(draft: &MaterialDraft, categories: &[Category]) -> Option<FinishingKind> {
    resolve_category_name(draft, categories).and_then(|n| FinishingKind::detect(&n))
}

pub fn cost_status(draft: &MaterialDraft) -> CostStatus {
    match (draft.unit_cost, draft.estimated_unit_cost) {
        (Some(_), _) => CostStatus::Provided,
        (None, Some(_)) => CostStatus::Estimated,
        (None, None) => CostStatus::Missing,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn non_blank_opt(s: &Option<String>) -> Option<String> {
    s.as_deref().and_then(non_blank)
}

pub fn build_payload(
    state: &WizardState,
    categories: &[Category],
) -> Result<MaterialPayload, ValidationError> {
    let entry_type = state.entry_type.ok_or(ValidationError::EntryTypeRequired)?;
    let draft = &state.draft;

    validate_for_submit(draft, entry_type)?;
    let quantity = draft.quantity.ok_or(ValidationError::QuantityRequired)?;

    let unit = draft.resolved_unit();
    if unit.is_empty() {
        return Err(if draft.is_custom_unit() {
            ValidationError::CustomUnitRequired
        } else {
            ValidationError::UnitRequired
        });
    }

    let category_name = resolve_category_name(draft, categories);
    let finishing_details = category_name
        .as_deref()
        .and_then(FinishingKind::detect)
        .filter(|_| finishing::has_content(&draft.finishing_details))
        .map(|_| finishing::compact(&draft.finishing_details));

    Ok(MaterialPayload {
        project_id: draft.project_id.trim().to_string(),
        name: draft.name.trim().to_string(),
        description: non_blank(&draft.description),
        category: category_name,
        category_id: non_blank(&draft.category_id),
        phase_id: draft.phase_id.trim().to_string(),
        floor: non_blank_opt(&draft.floor),
        quantity,
        unit,
        unit_cost: draft.unit_cost,
        estimated_unit_cost: draft.estimated_unit_cost,
        supplier_name: non_blank(&draft.supplier_name),
        purchase_date: draft.purchase_date,
        material_received_by: non_blank(&draft.material_received_by),
        retroactive_notes: non_blank(&draft.retroactive_notes),
        finishing_details,
        receipt_file_url: non_blank_opt(&draft.receipt_file_url),
        invoice_file_url: non_blank_opt(&draft.invoice_file_url),
        delivery_note_file_url: non_blank_opt(&draft.delivery_note_file_url),
        entry_type: EntryType::RetroactiveEntry,
        is_retroactive_entry: state.selected_entry_type == Some(EntryType::RetroactiveEntry),
        cost_status: cost_status(draft),
    })
}
