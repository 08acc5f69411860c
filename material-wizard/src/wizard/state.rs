// Material entry wizard: explicit state machine
//
// Pure transitions only. No I/O happens here; the session and the TUI drive fetches and feed
// results back through `apply_project_scope`.

use crate::error::ValidationError;
use crate::models::draft::{EntryType, MaterialDraft};
use crate::models::responses::{Floor, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Step {
    pub const ALL: [Step; 5] = [Step::One, Step::Two, Step::Three, Step::Four, Step::Five];

    pub fn number(&self) -> u8 {
        match self {
            Step::One => 1,
            Step::Two => 2,
            Step::Three => 3,
            Step::Four => 4,
            Step::Five => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Step::ALL.iter().copied().find(|s| s.number() == n)
    }

    pub fn next(&self) -> Step {
        match self {
            Step::One => Step::Two,
            Step::Two => Step::Three,
            Step::Three => Step::Four,
            Step::Four => Step::Five,
            Step::Five => Step::Five,
        }
    }

    pub fn prev(&self) -> Step {
        match self {
            Step::One => Step::One,
            Step::Two => Step::One,
            Step::Three => Step::Two,
            Step::Four => Step::Three,
            Step::Five => Step::Four,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::One => "Project & Material",
            Step::Two => "Quantity & Unit",
            Step::Three => "Cost & Supplier",
            Step::Four => "Documents",
            Step::Five => "Review & Submit",
        }
    }
}

/// What the wizard currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    ChooseEntryType,
    NewPurchaseNotice,
    Step(Step),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub step: Step,
    /// Effective entry type; drives which fields are required.
    pub entry_type: Option<EntryType>,
    /// What the user picked on the chooser, kept even after an emergency override.
    pub selected_entry_type: Option<EntryType>,
    pub draft: MaterialDraft,
    /// Last validation or submit error, shown as a dismissible banner.
    pub error: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            step: Step::One,
            entry_type: None,
            selected_entry_type: None,
            draft: MaterialDraft::default(),
            error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        match self.entry_type {
            None => Screen::ChooseEntryType,
            Some(EntryType::NewPurchase) => Screen::NewPurchaseNotice,
            Some(EntryType::RetroactiveEntry) => Screen::Step(self.step),
        }
    }

    pub fn is_retroactive(&self) -> bool {
        self.entry_type == Some(EntryType::RetroactiveEntry)
    }

    pub fn choose_entry_type(&mut self, entry_type: EntryType) {
        self.entry_type = Some(entry_type);
        self.selected_entry_type = Some(entry_type);
        self.step = Step::One;
        self.error = None;
    }

    /// Force the wizard into retroactive mode from the new-purchase notice.
    /// Returns false (and does nothing) from any other screen.
    pub fn emergency_override(&mut self) -> bool {
        if self.screen() != Screen::NewPurchaseNotice {
            return false;
        }
        self.entry_type = Some(EntryType::RetroactiveEntry);
        self.step = Step::One;
        self.error = None;
        true
    }

    /// Back to the chooser; the draft is kept.
    pub fn reset_entry_type(&mut self) {
        self.entry_type = None;
        self.selected_entry_type = None;
        self.step = Step::One;
        self.error = None;
    }

    /// Validate the current step and move forward on success.
    pub fn next_step(&mut self) -> Result<(), ValidationError> {
        let Some(entry_type) = self.entry_type else {
            self.error = Some(ValidationError::EntryTypeRequired.to_string());
            return Err(ValidationError::EntryTypeRequired);
        };
        match validate(self.step, &self.draft, entry_type) {
            Ok(()) => {
                self.step = self.step.next();
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Move back one step without validating. Never touches the draft.
    pub fn prev_step(&mut self) {
        self.step = self.step.prev();
        self.error = None;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Select a project. A different project clears the floor and phase selections.
    pub fn set_project(&mut self, project_id: &str) -> bool {
        let project_id = project_id.trim();
        if self.draft.project_id == project_id {
            return false;
        }
        self.draft.project_id = project_id.to_string();
        self.draft.floor = None;
        self.draft.phase_id.clear();
        true
    }

    /// Reconcile the draft with freshly fetched floors and phases.
    /// Results for a project that is no longer selected are ignored (returns false).
    pub fn apply_project_scope(&mut self, project_id: &str, floors: &[Floor], phases: &[Phase]) -> bool {
        if self.draft.project_id != project_id {
            return false;
        }
        if let Some(floor) = &self.draft.floor {
            if !floors.iter().any(|f| &f.id == floor) {
                self.draft.floor = None;
            }
        }
        if !self.draft.phase_id.is_empty() && !phases.iter().any(|p| p.id == self.draft.phase_id) {
            self.draft.phase_id.clear();
        }
        true
    }

    /// Merge one finishing field into the nested details.
    pub fn set_finishing_field(&mut self, key: &str, value: impl Into<String>) {
        self.draft
            .finishing_details
            .insert(key.to_string(), value.into());
    }

    /// `quantity × (unit cost or estimated unit cost)`, two decimals.
    pub fn calculate_total(&self) -> String {
        format!("{:.2}", total_amount(&self.draft))
    }
}

/// Numeric total behind `calculate_total`; missing values count as zero.
pub fn total_amount(draft: &MaterialDraft) -> f64 {
    let quantity = draft.quantity.unwrap_or(0.0);
    let cost = draft.effective_unit_cost().unwrap_or(0.0);
    quantity * cost
}

/// Consuming transition: validate and advance, or return the state with `error` set.
pub fn advance(mut state: WizardState) -> WizardState {
    let _ = state.next_step();
    state
}

/// Per-step validation gate.
pub fn validate(step: Step, draft: &MaterialDraft, entry_type: EntryType) -> Result<(), ValidationError> {
    match step {
        Step::One => {
            if draft.project_id.trim().is_empty() {
                return Err(ValidationError::ProjectRequired);
            }
            if draft.name.trim().is_empty() {
                return Err(ValidationError::NameRequired);
            }
            if draft.phase_id.trim().is_empty() {
                return Err(ValidationError::PhaseRequired);
            }
            Ok(())
        }
        Step::Two => {
            validate_quantity(draft)?;
            if draft.unit.trim().is_empty() {
                return Err(ValidationError::UnitRequired);
            }
            if draft.is_custom_unit() && draft.custom_unit.trim().is_empty() {
                return Err(ValidationError::CustomUnitRequired);
            }
            Ok(())
        }
        Step::Three => validate_cost(draft, entry_type),
        Step::Four | Step::Five => Ok(()),
    }
}

/// Checks re-run at submit regardless of the current step.
pub fn validate_for_submit(draft: &MaterialDraft, entry_type: EntryType) -> Result<(), ValidationError> {
    if draft.project_id.trim().is_empty() {
        return Err(ValidationError::ProjectRequired);
    }
    if draft.name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if draft.phase_id.trim().is_empty() {
        return Err(ValidationError::PhaseRequired);
    }
    validate_quantity(draft)?;
    validate_cost(draft, entry_type)
}

fn validate_quantity(draft: &MaterialDraft) -> Result<(), ValidationError> {
    match draft.quantity {
        Some(q) if q.is_finite() && q > 0.0 => Ok(()),
        _ => Err(ValidationError::QuantityRequired),
    }
}

fn validate_cost(draft: &MaterialDraft, entry_type: EntryType) -> Result<(), ValidationError> {
    match entry_type {
        EntryType::RetroactiveEntry => {
            if matches!(draft.unit_cost, Some(c) if !c.is_finite() || c <= 0.0) {
                return Err(ValidationError::InvalidUnitCost);
            }
            if matches!(draft.estimated_unit_cost, Some(c) if !c.is_finite() || c <= 0.0) {
                return Err(ValidationError::InvalidEstimatedUnitCost);
            }
            Ok(())
        }
        EntryType::NewPurchase => {
            match draft.unit_cost {
                Some(c) if c.is_finite() && c > 0.0 => {}
                _ => return Err(ValidationError::UnitCostRequired),
            }
            if draft.supplier_name.trim().is_empty() {
                return Err(ValidationError::SupplierRequired);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::draft::OTHERS_UNIT;

    fn retro_state() -> WizardState {
        let mut s = WizardState::new();
        s.choose_entry_type(EntryType::RetroactiveEntry);
        s
    }

    fn step_one_draft() -> MaterialDraft {
        MaterialDraft {
            project_id: "P1".to_string(),
            name: "Cement".to_string(),
            phase_id: "PH1".to_string(),
            ..Default::default()
        }
    }

    fn floor(id: &str) -> Floor {
        Floor {
            id: id.to_string(),
            name: id.to_string(),
            floor_number: None,
        }
    }

    fn phase(id: &str) -> Phase {
        Phase {
            id: id.to_string(),
            name: id.to_string(),
            project_id: None,
        }
    }

    // -------------------------------------------------------------------------
    // Screens and entry type
    // -------------------------------------------------------------------------

    #[test]
    fn screen_follows_entry_type() {
        let mut s = WizardState::new();
        assert_eq!(s.screen(), Screen::ChooseEntryType);
        s.choose_entry_type(EntryType::NewPurchase);
        assert_eq!(s.screen(), Screen::NewPurchaseNotice);
        s.reset_entry_type();
        s.choose_entry_type(EntryType::RetroactiveEntry);
        assert_eq!(s.screen(), Screen::Step(Step::One));
    }

    #[test]
    fn emergency_override_switches_effective_type_only() {
        let mut s = WizardState::new();
        assert!(!s.emergency_override(), "no override from the chooser");
        s.choose_entry_type(EntryType::NewPurchase);
        assert!(s.emergency_override());
        assert_eq!(s.entry_type, Some(EntryType::RetroactiveEntry));
        assert_eq!(s.selected_entry_type, Some(EntryType::NewPurchase));
        assert_eq!(s.screen(), Screen::Step(Step::One));
        assert!(!s.emergency_override(), "override is only offered once");
    }

    #[test]
    fn next_step_without_entry_type_fails() {
        let mut s = WizardState::new();
        assert_eq!(s.next_step(), Err(ValidationError::EntryTypeRequired));
        assert!(s.error.is_some());
    }

    // -------------------------------------------------------------------------
    // Step transitions
    // -------------------------------------------------------------------------

    #[test]
    fn failed_validation_sets_error_and_stays() {
        let mut s = retro_state();
        s.draft.project_id = "P1".to_string();
        assert_eq!(s.next_step(), Err(ValidationError::NameRequired));
        assert_eq!(s.step, Step::One);
        assert_eq!(s.error.as_deref(), Some("Material name is required."));
    }

    #[test]
    fn successful_validation_advances_and_clears_error() {
        let mut s = retro_state();
        s.error = Some("stale".to_string());
        s.draft = step_one_draft();
        assert!(s.next_step().is_ok());
        assert_eq!(s.step, Step::Two);
        assert!(s.error.is_none());
    }

    #[test]
    fn advance_is_consuming_form_of_next_step() {
        let mut s = retro_state();
        s.draft = step_one_draft();
        let s = advance(s);
        assert_eq!(s.step, Step::Two);
        let s = advance(s);
        assert_eq!(s.step, Step::Two, "quantity missing");
        assert_eq!(
            s.error.as_deref(),
            Some("Quantity must be greater than zero.")
        );
    }

    #[test]
    fn prev_step_keeps_data_and_skips_validation() {
        let mut s = retro_state();
        s.draft = step_one_draft();
        s.next_step().unwrap();
        s.draft.quantity = Some(-3.0);
        s.prev_step();
        assert_eq!(s.step, Step::One);
        assert_eq!(s.draft.quantity, Some(-3.0));
        assert_eq!(s.draft.name, "Cement");
        s.prev_step();
        assert_eq!(s.step, Step::One);
    }

    #[test]
    fn step_five_does_not_advance() {
        let mut s = retro_state();
        s.step = Step::Five;
        assert!(s.next_step().is_ok());
        assert_eq!(s.step, Step::Five);
    }

    #[test]
    fn full_retroactive_walk_reaches_review() {
        let mut s = retro_state();
        s.draft = step_one_draft();
        s.draft.quantity = Some(50.0);
        s.draft.unit = "bag".to_string();
        for _ in 0..4 {
            s.next_step().unwrap();
        }
        assert_eq!(s.screen(), Screen::Step(Step::Five));
    }

    // -------------------------------------------------------------------------
    // Per-step validation contract
    // -------------------------------------------------------------------------

    #[test]
    fn step_one_requires_project_name_and_phase() {
        let retro = EntryType::RetroactiveEntry;
        let mut d = MaterialDraft::default();
        assert_eq!(validate(Step::One, &d, retro), Err(ValidationError::ProjectRequired));
        d.project_id = "P1".to_string();
        d.name = "   ".to_string();
        assert_eq!(validate(Step::One, &d, retro), Err(ValidationError::NameRequired));
        d.name = "Sand".to_string();
        assert_eq!(validate(Step::One, &d, retro), Err(ValidationError::PhaseRequired));
        d.phase_id = "PH1".to_string();
        assert!(validate(Step::One, &d, retro).is_ok());
    }

    #[test]
    fn step_two_rejects_others_without_custom_unit() {
        let mut s = retro_state();
        s.step = Step::Two;
        s.draft.quantity = Some(4.0);
        s.draft.unit = OTHERS_UNIT.to_string();
        s.draft.custom_unit = "  ".to_string();
        assert_eq!(s.next_step(), Err(ValidationError::CustomUnitRequired));
        assert_eq!(s.step, Step::Two);

        s.draft.custom_unit = "drum".to_string();
        assert!(s.next_step().is_ok());
        assert_eq!(s.step, Step::Three);
    }

    #[test]
    fn step_two_requires_positive_quantity_and_unit() {
        let retro = EntryType::RetroactiveEntry;
        let mut d = MaterialDraft {
            quantity: Some(0.0),
            unit: "bag".to_string(),
            ..Default::default()
        };
        assert_eq!(validate(Step::Two, &d, retro), Err(ValidationError::QuantityRequired));
        d.quantity = Some(1.5);
        d.unit.clear();
        assert_eq!(validate(Step::Two, &d, retro), Err(ValidationError::UnitRequired));
    }

    #[test]
    fn step_three_retroactive_costs_are_optional_but_positive() {
        let retro = EntryType::RetroactiveEntry;
        let mut d = MaterialDraft::default();
        assert!(validate(Step::Three, &d, retro).is_ok());
        d.unit_cost = Some(0.0);
        assert_eq!(validate(Step::Three, &d, retro), Err(ValidationError::InvalidUnitCost));
        d.unit_cost = None;
        d.estimated_unit_cost = Some(-1.0);
        assert_eq!(
            validate(Step::Three, &d, retro),
            Err(ValidationError::InvalidEstimatedUnitCost)
        );
    }

    #[test]
    fn step_three_new_purchase_requires_cost_and_supplier() {
        let np = EntryType::NewPurchase;
        let mut d = MaterialDraft::default();
        assert_eq!(validate(Step::Three, &d, np), Err(ValidationError::UnitCostRequired));
        d.unit_cost = Some(25.0);
        assert_eq!(validate(Step::Three, &d, np), Err(ValidationError::SupplierRequired));
        d.supplier_name = "Dangote".to_string();
        assert!(validate(Step::Three, &d, np).is_ok());
    }

    #[test]
    fn non_finite_quantity_and_costs_are_rejected() {
        let retro = EntryType::RetroactiveEntry;
        let mut d = step_one_draft();
        d.unit = "bag".to_string();
        d.quantity = Some(f64::INFINITY);
        assert_eq!(validate(Step::Two, &d, retro), Err(ValidationError::QuantityRequired));
        assert_eq!(
            validate_for_submit(&d, retro),
            Err(ValidationError::QuantityRequired)
        );
        d.quantity = Some(f64::NAN);
        assert_eq!(validate(Step::Two, &d, retro), Err(ValidationError::QuantityRequired));

        d.quantity = Some(10.0);
        d.unit_cost = Some(f64::INFINITY);
        assert_eq!(validate(Step::Three, &d, retro), Err(ValidationError::InvalidUnitCost));
        d.unit_cost = None;
        d.estimated_unit_cost = Some(f64::NAN);
        assert_eq!(
            validate(Step::Three, &d, retro),
            Err(ValidationError::InvalidEstimatedUnitCost)
        );

        let mut np = d.clone();
        np.estimated_unit_cost = None;
        np.supplier_name = "Dangote".to_string();
        np.unit_cost = Some(f64::INFINITY);
        assert_eq!(
            validate(Step::Three, &np, EntryType::NewPurchase),
            Err(ValidationError::UnitCostRequired)
        );
    }

    #[test]
    fn step_four_is_always_valid() {
        let d = MaterialDraft::default();
        assert!(validate(Step::Four, &d, EntryType::NewPurchase).is_ok());
    }

    #[test]
    fn validate_for_submit_rechecks_core_fields() {
        let mut d = step_one_draft();
        assert_eq!(
            validate_for_submit(&d, EntryType::RetroactiveEntry),
            Err(ValidationError::QuantityRequired)
        );
        d.quantity = Some(50.0);
        assert!(validate_for_submit(&d, EntryType::RetroactiveEntry).is_ok());
        assert_eq!(
            validate_for_submit(&d, EntryType::NewPurchase),
            Err(ValidationError::UnitCostRequired)
        );
    }

    // -------------------------------------------------------------------------
    // Project scope
    // -------------------------------------------------------------------------

    #[test]
    fn switching_project_clears_floor_and_phase() {
        let mut s = retro_state();
        s.draft = step_one_draft();
        s.draft.floor = Some("F1".to_string());
        assert!(!s.set_project("P1"), "same project is not a change");
        assert_eq!(s.draft.phase_id, "PH1");

        assert!(s.set_project("P2"));
        assert_eq!(s.draft.project_id, "P2");
        assert!(s.draft.floor.is_none());
        assert!(s.draft.phase_id.is_empty());
    }

    #[test]
    fn apply_project_scope_clears_stale_selections() {
        let mut s = retro_state();
        s.draft = step_one_draft();
        s.draft.floor = Some("F9".to_string());
        assert!(s.apply_project_scope("P1", &[floor("F1")], &[phase("PH1")]));
        assert!(s.draft.floor.is_none());
        assert_eq!(s.draft.phase_id, "PH1");

        assert!(s.apply_project_scope("P1", &[], &[phase("PH2")]));
        assert!(s.draft.phase_id.is_empty());
    }

    #[test]
    fn apply_project_scope_ignores_other_projects() {
        let mut s = retro_state();
        s.draft = step_one_draft();
        assert!(!s.apply_project_scope("P-old", &[], &[]));
        assert_eq!(s.draft.phase_id, "PH1");
    }

    // -------------------------------------------------------------------------
    // Derived total and finishing setter
    // -------------------------------------------------------------------------

    #[test]
    fn calculate_total_is_pure_and_two_decimals() {
        let mut s = retro_state();
        s.draft.quantity = Some(10.0);
        s.draft.unit_cost = Some(25.5);
        assert_eq!(s.calculate_total(), "255.00");
        assert_eq!(s.calculate_total(), "255.00");

        s.draft.quantity = Some(0.0);
        assert_eq!(s.calculate_total(), "0.00");

        s.draft.quantity = Some(10.0);
        s.draft.unit_cost = None;
        assert_eq!(s.calculate_total(), "0.00");

        s.draft.estimated_unit_cost = Some(3.333);
        assert_eq!(s.calculate_total(), "33.33");
    }

    #[test]
    fn set_finishing_field_merges() {
        let mut s = retro_state();
        s.set_finishing_field("brand", "Schneider");
        s.set_finishing_field("technicianName", "Tunde");
        s.set_finishing_field("brand", "ABB");
        assert_eq!(s.draft.finishing_details.len(), 2);
        assert_eq!(s.draft.finishing_details["brand"], "ABB");
    }
}
