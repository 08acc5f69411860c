//! Headless terminal wizard for recording a material.
//!
//! Layout:
//! - Centered window titled "Add Material"
//! - Left panel with the step list, right panel with the current page
//! - Dismissible error banner under the header
//! - Bottom button row: [ Back ] [ Next ] [ Cancel ], with toasts just above it
//! - Modal confirmations (Cancel, emergency override notice)
//!
//! Network work runs on a background tokio runtime and reports back over a channel. Every
//! project-scope fetch carries a generation number and a cancellation token so a stale answer
//! (older project, or one that lands after exit) never touches the state.
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to avoid corrupting the terminal UI.

use crate::api::{ApiClient, CachedReferenceData};
use crate::config::{Settings, WizardSettings};
use crate::models::draft::{EntryType, UNITS};
use crate::models::requests::CostStatus;
use crate::models::responses::{Category, Floor, Phase, Project};
use crate::utils::format::{format_currency, format_date, format_quantity};
use crate::utils::validation::{optional_text, parse_date, parse_decimal};
use crate::wizard::finishing::FinishingKind;
use crate::wizard::payload::{build_payload, cost_status, finishing_kind, resolve_category_name};
use crate::wizard::session::{self, Lookups, ProjectScope, SubmitOutcome};
use crate::wizard::state::{total_amount, Screen, Step, WizardState};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{debug, info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Pages accepted by `--tui-smoke=<page>`.
pub const SMOKE_TARGETS: &[&str] = &[
    "chooser", "notice", "step1", "step2", "step3", "step4", "review", "complete", "cancel",
    "error",
];

const TOAST_TTL: Duration = Duration::from_secs(5);
const LONG_TOAST_TTL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    ChooseEntryType,
    NewPurchaseNotice,
    Step(Step),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FieldId {
    Project,
    Name,
    Description,
    Category,
    Phase,
    Floor,
    Quantity,
    Unit,
    CustomUnit,
    UnitCost,
    EstimatedUnitCost,
    Supplier,
    PurchaseDate,
    ReceivedBy,
    RetroNotes,
    ReceiptUrl,
    InvoiceUrl,
    DeliveryNoteUrl,
    /// Index into the active finishing kind's field list.
    Finishing(usize),
}

impl FieldId {
    fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldId::Project | FieldId::Category | FieldId::Phase | FieldId::Floor | FieldId::Unit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Field(FieldId),
    Button(ButtonFocus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel { return_focus: FocusTarget },
    Message { title: String, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    kind: ToastKind,
    text: String,
    expires_at: Instant,
}

/// Single-line editor. `cursor` counts chars, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            cursor: value.chars().count(),
            value,
        }
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn display_with_cursor(&self) -> String {
        let i = self.byte_index();
        format!("{}|{}", &self.value[..i], &self.value[i..])
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        let len = self.value.chars().count();
        match code {
            KeyCode::Char(c) => {
                let i = self.byte_index();
                self.value.insert(i, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let i = self.byte_index();
                    self.value.remove(i);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let i = self.byte_index();
                    self.value.remove(i);
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(len);
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = len;
                true
            }
            _ => false,
        }
    }
}

/// Results coming back from the background runtime.
#[derive(Debug)]
enum UiMsg {
    LookupsLoaded(Lookups),
    DefaultEntryType(Option<EntryType>),
    ScopeLoaded { generation: u64, scope: ProjectScope },
    SubmitFinished(Result<SubmitOutcome, String>),
}

/// Work requested by a key press, executed by the run loop.
#[derive(Debug)]
enum Command {
    LoadProjectScope {
        project_id: String,
        generation: u64,
        cancel: CancellationToken,
    },
    Submit {
        state: Box<WizardState>,
        categories: Vec<Category>,
    },
}

struct UiState {
    wizard: WizardState,
    outcome: Option<SubmitOutcome>,
    entry_choice: EntryType,
    default_entry_type: Option<EntryType>,

    lookups: Lookups,
    lookups_loaded: bool,
    scope: Option<ProjectScope>,
    scope_loading: bool,
    scope_generation: u64,
    scope_cancel: Option<CancellationToken>,
    shutdown: CancellationToken,

    inputs: HashMap<FieldId, TextInput>,
    field_errors: HashMap<FieldId, String>,
    focus: FocusTarget,
    modal: Option<Modal>,
    toasts: Vec<Toast>,
    submitting: bool,
    pending: Vec<Command>,
    currency_symbol: String,
    quit: bool,
}

impl UiState {
    fn new(settings: &Settings) -> Self {
        Self {
            wizard: WizardState::new(),
            outcome: None,
            entry_choice: EntryType::RetroactiveEntry,
            default_entry_type: None,
            lookups: Lookups::default(),
            lookups_loaded: false,
            scope: None,
            scope_loading: false,
            scope_generation: 0,
            scope_cancel: None,
            shutdown: CancellationToken::new(),
            inputs: HashMap::new(),
            field_errors: HashMap::new(),
            focus: FocusTarget::Button(ButtonFocus::Next),
            modal: None,
            toasts: Vec::new(),
            submitting: false,
            pending: Vec::new(),
            currency_symbol: settings.wizard.currency_symbol.clone(),
            quit: false,
        }
    }
}

// -----------------------------------------------------------------------------
// Background runtime
// -----------------------------------------------------------------------------

struct Worker {
    rt: tokio::runtime::Runtime,
    reference: Arc<CachedReferenceData<ApiClient>>,
    gateway: Arc<ApiClient>,
    tx: mpsc::Sender<UiMsg>,
}

impl Worker {
    fn start(settings: &Settings, tx: mpsc::Sender<UiMsg>) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("material-wizard-io")
            .enable_all()
            .build()
            .context("Failed to start background runtime")?;

        let client = {
            let _guard = rt.enter();
            ApiClient::new(&settings.api)?
        };
        info!(
            "[PHASE: tui] [STEP: worker] Background runtime ready, backend {}",
            client.base_url()
        );

        Ok(Self {
            rt,
            reference: Arc::new(CachedReferenceData::new(client.clone())),
            gateway: Arc::new(client),
            tx,
        })
    }

    fn load_initial(&self, wizard_settings: WizardSettings) {
        let reference = Arc::clone(&self.reference);
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let lookups = session::load_lookups(&*reference).await;
            let _ = tx.send(UiMsg::LookupsLoaded(lookups));
        });

        let reference = Arc::clone(&self.reference);
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let default = session::default_entry_type(&*reference, &wizard_settings).await;
            let _ = tx.send(UiMsg::DefaultEntryType(default));
        });
    }

    fn dispatch(&self, cmd: Command) {
        match cmd {
            Command::LoadProjectScope {
                project_id,
                generation,
                cancel,
            } => {
                let reference = Arc::clone(&self.reference);
                let tx = self.tx.clone();
                self.rt.spawn(async move {
                    if let Some(scope) =
                        session::load_project_scope(&*reference, &project_id, &cancel).await
                    {
                        let _ = tx.send(UiMsg::ScopeLoaded { generation, scope });
                    }
                });
            }
            Command::Submit { state, categories } => {
                let gateway = Arc::clone(&self.gateway);
                let tx = self.tx.clone();
                self.rt.spawn(async move {
                    let result = session::submit(&*gateway, &state, &categories)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(UiMsg::SubmitFinished(result));
                });
            }
        }
    }

    fn shutdown(self) {
        self.rt.shutdown_timeout(Duration::from_millis(500));
    }
}

// -----------------------------------------------------------------------------
// Entry points
// -----------------------------------------------------------------------------

pub fn run(settings: &Settings, prefill_project: Option<&str>) -> Result<()> {
    info!("[PHASE: tui] [STEP: start] Starting material wizard");

    let (tx, rx) = mpsc::channel::<UiMsg>();
    let worker = Worker::start(settings, tx)?;

    let mut ui = UiState::new(settings);
    if let Some(project_id) = prefill_project.map(str::trim).filter(|p| !p.is_empty()) {
        info!(
            "[PHASE: tui] [STEP: prefill] Project preselected: {}",
            project_id
        );
        select_project(&mut ui, project_id);
    }
    worker.load_initial(settings.wizard.clone());

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, &mut ui, &worker, &rx);
    restore_terminal(&mut terminal)?;

    ui.shutdown.cancel();
    worker.shutdown();
    info!("[PHASE: tui] [STEP: exit] Material wizard closed");

    result
}

/// Non-interactive smoke mode: render a single frame and exit.
pub fn smoke(settings: &Settings, target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    let t = target.trim().to_ascii_lowercase();
    let ui = new_smoke_ui_state(settings, t.as_str());

    // In-memory backend: no raw mode, no alternate screen.
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, &ui))?;

    Ok(())
}

fn new_smoke_ui_state(settings: &Settings, target: &str) -> UiState {
    let mut ui = UiState::new(settings);
    ui.lookups = Lookups {
        categories: vec![
            Category {
                id: "cat-cement".to_string(),
                name: "Cement".to_string(),
            },
            Category {
                id: "cat-tiling".to_string(),
                name: "Floor Tiling".to_string(),
            },
        ],
        projects: vec![Project {
            id: "proj-lekki".to_string(),
            name: "Lekki Towers".to_string(),
        }],
    };
    ui.lookups_loaded = true;

    let seed = |ui: &mut UiState, step: Step| {
        ui.wizard.choose_entry_type(EntryType::RetroactiveEntry);
        ui.wizard.set_project("proj-lekki");
        ui.scope = Some(ProjectScope {
            project_id: "proj-lekki".to_string(),
            floors: vec![
                Floor {
                    id: "fl-0".to_string(),
                    name: String::new(),
                    floor_number: Some(0),
                },
                Floor {
                    id: "fl-1".to_string(),
                    name: String::new(),
                    floor_number: Some(1),
                },
            ],
            phases: vec![Phase {
                id: "ph-super".to_string(),
                name: "Superstructure".to_string(),
                project_id: Some("proj-lekki".to_string()),
            }],
        });
        let d = &mut ui.wizard.draft;
        d.name = "Porcelain floor tiles".to_string();
        d.category_id = "cat-tiling".to_string();
        d.phase_id = "ph-super".to_string();
        d.floor = Some("fl-1".to_string());
        d.quantity = Some(50.0);
        d.unit = "box".to_string();
        d.estimated_unit_cost = Some(250.0);
        d.material_received_by = "Storekeeper".to_string();
        ui.wizard.set_finishing_field("tileType", "Porcelain");
        ui.wizard.step = step;
    };

    match target {
        "notice" => ui.wizard.choose_entry_type(EntryType::NewPurchase),
        "cancel" => seed(&mut ui, Step::One),
        "review" => seed(&mut ui, Step::Five),
        "error" => {
            seed(&mut ui, Step::Two);
            ui.wizard.draft.quantity = None;
            let _ = ui.wizard.next_step();
        }
        "complete" => {
            seed(&mut ui, Step::Five);
            ui.outcome = Some(SubmitOutcome {
                material_id: "mat-0001".to_string(),
                capital_warning: Some(
                    "Material cost exceeds the project's available capital.".to_string(),
                ),
                detail_path: "/items/mat-0001".to_string(),
            });
        }
        "chooser" | "" => {}
        other if other.starts_with("step") => {
            match other[4..].parse::<u8>().ok().and_then(Step::from_number) {
                Some(step) => seed(&mut ui, step),
                None => warn!(
                    "[PHASE: tui] [STEP: smoke] No such step '{}', rendering the chooser",
                    other
                ),
            }
        }
        other => warn!(
            "[PHASE: tui] [STEP: smoke] Unknown smoke target '{}', rendering the chooser",
            other
        ),
    }

    focus_first(&mut ui);
    if target == "cancel" {
        open_cancel_modal(&mut ui);
    }
    if target == "complete" {
        if let Some(w) = ui.outcome.as_ref().and_then(|o| o.capital_warning.clone()) {
            push_toast(&mut ui, ToastKind::Warning, w, LONG_TOAST_TTL);
        }
    }
    ui
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ui: &mut UiState,
    worker: &Worker,
    rx: &mpsc::Receiver<UiMsg>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    while !ui.quit {
        drain_messages(ui, rx);
        for cmd in ui.pending.drain(..) {
            worker.dispatch(cmd);
        }

        let now = Instant::now();
        ui.toasts.retain(|t| t.expires_at > now);

        terminal.draw(|f| draw(f.size(), f, ui))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(ui, key.code);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn drain_messages(ui: &mut UiState, rx: &mpsc::Receiver<UiMsg>) {
    while let Ok(msg) = rx.try_recv() {
        apply_msg(ui, msg);
    }
}

fn apply_msg(ui: &mut UiState, msg: UiMsg) {
    match msg {
        UiMsg::LookupsLoaded(lookups) => {
            let project_id = ui.wizard.draft.project_id.clone();
            if !project_id.is_empty()
                && !lookups.projects.is_empty()
                && !lookups.projects.iter().any(|p| p.id == project_id)
            {
                warn!(
                    "[PHASE: tui] [STEP: lookups] Preselected project {} is not in the project list",
                    project_id
                );
            }
            ui.lookups = lookups;
            ui.lookups_loaded = true;
        }
        UiMsg::DefaultEntryType(default) => {
            ui.default_entry_type = default;
            if let Some(entry_type) = default {
                if ui.wizard.entry_type.is_none() && ui.outcome.is_none() {
                    ui.wizard.choose_entry_type(entry_type);
                    focus_first(ui);
                }
            }
        }
        UiMsg::ScopeLoaded { generation, scope } => {
            if generation != ui.scope_generation {
                debug!(
                    "[PHASE: tui] [STEP: scope] Dropping stale scope for {} (generation {} != {})",
                    scope.project_id, generation, ui.scope_generation
                );
                return;
            }
            ui.scope_loading = false;
            ui.scope_cancel = None;
            ui.wizard
                .apply_project_scope(&scope.project_id, &scope.floors, &scope.phases);
            ui.scope = Some(scope);
        }
        UiMsg::SubmitFinished(result) => {
            ui.submitting = false;
            match result {
                Ok(outcome) => {
                    match outcome.capital_warning.clone() {
                        Some(w) => push_toast(ui, ToastKind::Warning, w, LONG_TOAST_TTL),
                        None => push_toast(
                            ui,
                            ToastKind::Success,
                            "Material recorded.".to_string(),
                            TOAST_TTL,
                        ),
                    }
                    ui.outcome = Some(outcome);
                    focus_first(ui);
                }
                Err(message) => {
                    ui.wizard.error = Some(message.clone());
                    push_toast(ui, ToastKind::Error, message, TOAST_TTL);
                }
            }
        }
    }
}

fn push_toast(ui: &mut UiState, kind: ToastKind, text: String, ttl: Duration) {
    ui.toasts.push(Toast {
        kind,
        text,
        expires_at: Instant::now() + ttl,
    });
}

// -----------------------------------------------------------------------------
// Navigation
// -----------------------------------------------------------------------------

fn current_page(ui: &UiState) -> Page {
    if ui.outcome.is_some() {
        return Page::Complete;
    }
    match ui.wizard.screen() {
        Screen::ChooseEntryType => Page::ChooseEntryType,
        Screen::NewPurchaseNotice => Page::NewPurchaseNotice,
        Screen::Step(step) => Page::Step(step),
    }
}

fn page_title(page: Page) -> &'static str {
    match page {
        Page::ChooseEntryType => "Entry Type",
        Page::NewPurchaseNotice => "New Purchase",
        Page::Step(step) => step.title(),
        Page::Complete => "Material Saved",
    }
}

fn next_label(page: Page) -> &'static str {
    match page {
        Page::Step(Step::Five) => "Submit",
        Page::Complete => "Finish",
        _ => "Next",
    }
}

fn can_go_back(ui: &UiState) -> bool {
    !ui.submitting
        && matches!(
            current_page(ui),
            Page::NewPurchaseNotice | Page::Step(_)
        )
}

fn can_go_next(ui: &UiState) -> bool {
    match current_page(ui) {
        Page::NewPurchaseNotice => false,
        Page::Step(_) => !ui.submitting,
        Page::ChooseEntryType | Page::Complete => true,
    }
}

fn can_cancel(ui: &UiState) -> bool {
    current_page(ui) != Page::Complete
}

fn active_finishing(ui: &UiState) -> Option<FinishingKind> {
    finishing_kind(&ui.wizard.draft, &ui.lookups.categories)
}

fn page_fields(ui: &UiState) -> Vec<FieldId> {
    match current_page(ui) {
        Page::Step(Step::One) => vec![
            FieldId::Project,
            FieldId::Name,
            FieldId::Description,
            FieldId::Category,
            FieldId::Phase,
            FieldId::Floor,
        ],
        Page::Step(Step::Two) => {
            let mut fields = vec![FieldId::Quantity, FieldId::Unit];
            if ui.wizard.draft.is_custom_unit() {
                fields.push(FieldId::CustomUnit);
            }
            fields
        }
        Page::Step(Step::Three) => vec![
            FieldId::UnitCost,
            FieldId::EstimatedUnitCost,
            FieldId::Supplier,
            FieldId::PurchaseDate,
            FieldId::ReceivedBy,
            FieldId::RetroNotes,
        ],
        Page::Step(Step::Four) => {
            let mut fields = vec![
                FieldId::ReceiptUrl,
                FieldId::InvoiceUrl,
                FieldId::DeliveryNoteUrl,
            ];
            if let Some(kind) = active_finishing(ui) {
                fields.extend((0..kind.fields().len()).map(FieldId::Finishing));
            }
            fields
        }
        _ => Vec::new(),
    }
}

fn focus_order(ui: &UiState) -> Vec<FocusTarget> {
    let mut order: Vec<FocusTarget> = page_fields(ui).into_iter().map(FocusTarget::Field).collect();
    order.extend([
        FocusTarget::Button(ButtonFocus::Back),
        FocusTarget::Button(ButtonFocus::Next),
        FocusTarget::Button(ButtonFocus::Cancel),
    ]);
    order
}

fn focus_first(ui: &mut UiState) {
    ui.focus = match (current_page(ui), page_fields(ui).first()) {
        (_, Some(field)) => FocusTarget::Field(*field),
        (Page::NewPurchaseNotice, None) => FocusTarget::Button(ButtonFocus::Back),
        _ => FocusTarget::Button(ButtonFocus::Next),
    };
}

fn cycle_focus(ui: &mut UiState, forward: bool) {
    let order = focus_order(ui);
    let pos = order.iter().position(|f| *f == ui.focus);
    ui.focus = order[cycle_index(pos, order.len(), forward)];
}

fn move_field_focus(ui: &mut UiState, forward: bool) {
    let fields = page_fields(ui);
    if fields.is_empty() {
        return;
    }
    let pos = match ui.focus {
        FocusTarget::Field(f) => fields.iter().position(|x| *x == f),
        FocusTarget::Button(_) => None,
    };
    ui.focus = FocusTarget::Field(fields[cycle_index(pos, fields.len(), forward)]);
}

/// Next index in a ring of `len` (> 0) entries; `None` starts at either end.
fn cycle_index(current: Option<usize>, len: usize, forward: bool) -> usize {
    match (current, forward) {
        (None, true) => 0,
        (None, false) => len.saturating_sub(1),
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    }
}

fn focused_button(ui: &UiState) -> ButtonFocus {
    match ui.focus {
        FocusTarget::Button(b) => b,
        FocusTarget::Field(_) => ButtonFocus::Next,
    }
}

fn open_cancel_modal(ui: &mut UiState) {
    ui.modal = Some(Modal::ConfirmCancel {
        return_focus: ui.focus,
    });
    // "No" is the default.
    ui.focus = FocusTarget::Button(ButtonFocus::Next);
}

fn go_next(ui: &mut UiState) {
    match current_page(ui) {
        Page::ChooseEntryType => {
            let choice = ui.entry_choice;
            info!(
                "[PHASE: wizard] [STEP: entry_type] Entry type chosen: {}",
                choice.as_id()
            );
            ui.wizard.choose_entry_type(choice);
            focus_first(ui);
        }
        Page::NewPurchaseNotice => {}
        Page::Step(step) => {
            if let Some(message) = first_field_error(ui) {
                ui.wizard.error = Some(message);
                return;
            }
            if step == Step::Five {
                start_submit(ui);
                return;
            }
            match ui.wizard.next_step() {
                Ok(()) => {
                    info!(
                        "[PHASE: wizard] [STEP: step_{}] Advanced to step {}",
                        step.number(),
                        ui.wizard.step.number()
                    );
                    focus_first(ui);
                }
                Err(e) => {
                    debug!(
                        "[PHASE: wizard] [STEP: step_{}] Blocked: {}",
                        step.number(),
                        e
                    );
                }
            }
        }
        Page::Complete => ui.quit = true,
    }
}

fn go_back(ui: &mut UiState) {
    match current_page(ui) {
        Page::NewPurchaseNotice | Page::Step(Step::One) => ui.wizard.reset_entry_type(),
        Page::Step(_) => ui.wizard.prev_step(),
        _ => return,
    }
    focus_first(ui);
}

fn start_submit(ui: &mut UiState) {
    if ui.submitting {
        return;
    }
    if let Err(e) = build_payload(&ui.wizard, &ui.lookups.categories) {
        warn!("[PHASE: submit] [STEP: validate] Submit blocked: {}", e);
        ui.wizard.error = Some(e.to_string());
        return;
    }
    ui.submitting = true;
    ui.wizard.dismiss_error();
    ui.pending.push(Command::Submit {
        state: Box::new(ui.wizard.clone()),
        categories: ui.lookups.categories.clone(),
    });
}

fn reset_for_another(ui: &mut UiState) {
    if let Some(token) = ui.scope_cancel.take() {
        token.cancel();
    }
    ui.scope_generation += 1;
    ui.scope = None;
    ui.scope_loading = false;
    ui.wizard = WizardState::new();
    ui.outcome = None;
    ui.inputs.clear();
    ui.field_errors.clear();
    if let Some(entry_type) = ui.default_entry_type {
        ui.wizard.choose_entry_type(entry_type);
    }
    focus_first(ui);
}

fn first_field_error(ui: &UiState) -> Option<String> {
    page_fields(ui).into_iter().find_map(|field| {
        ui.field_errors
            .get(&field)
            .map(|e| format!("{}: {}", field_label(ui, field), e))
    })
}

// -----------------------------------------------------------------------------
// Field editing
// -----------------------------------------------------------------------------

fn current_scope(ui: &UiState) -> Option<&ProjectScope> {
    ui.scope
        .as_ref()
        .filter(|s| s.project_id == ui.wizard.draft.project_id)
}

fn request_scope(ui: &mut UiState, project_id: &str) {
    if let Some(prev) = ui.scope_cancel.take() {
        prev.cancel();
    }
    ui.scope_generation += 1;
    let cancel = ui.shutdown.child_token();
    ui.scope_cancel = Some(cancel.clone());
    ui.scope_loading = true;
    ui.pending.push(Command::LoadProjectScope {
        project_id: project_id.to_string(),
        generation: ui.scope_generation,
        cancel,
    });
}

fn select_project(ui: &mut UiState, project_id: &str) {
    if ui.wizard.set_project(project_id) {
        ui.scope = None;
        request_scope(ui, project_id);
    }
}

fn cycle_choice(ui: &mut UiState, field: FieldId, forward: bool) {
    match field {
        FieldId::Project => {
            let ids: Vec<String> = ui.lookups.projects.iter().map(|p| p.id.clone()).collect();
            if ids.is_empty() {
                return;
            }
            let pos = ids.iter().position(|id| *id == ui.wizard.draft.project_id);
            let id = ids[cycle_index(pos, ids.len(), forward)].clone();
            select_project(ui, &id);
        }
        FieldId::Category => {
            let before = active_finishing(ui);
            // Slot 0 is "(none)".
            let len = ui.lookups.categories.len() + 1;
            let pos = ui
                .lookups
                .categories
                .iter()
                .position(|c| c.id == ui.wizard.draft.category_id)
                .map(|i| i + 1)
                .unwrap_or(0);
            let next = cycle_index(Some(pos), len, forward);
            let (id, name) = match next.checked_sub(1).and_then(|i| ui.lookups.categories.get(i)) {
                Some(c) => (c.id.clone(), c.name.clone()),
                None => (String::new(), String::new()),
            };
            ui.wizard.draft.category_id = id;
            ui.wizard.draft.category = name;
            if active_finishing(ui) != before {
                ui.wizard.draft.finishing_details.clear();
                ui.inputs.retain(|k, _| !matches!(k, FieldId::Finishing(_)));
                ui.field_errors
                    .retain(|k, _| !matches!(k, FieldId::Finishing(_)));
            }
        }
        FieldId::Phase => {
            let ids: Vec<String> = current_scope(ui)
                .map(|s| s.phases.iter().map(|p| p.id.clone()).collect())
                .unwrap_or_default();
            if ids.is_empty() {
                return;
            }
            let pos = ids.iter().position(|id| *id == ui.wizard.draft.phase_id);
            ui.wizard.draft.phase_id = ids[cycle_index(pos, ids.len(), forward)].clone();
        }
        FieldId::Floor => {
            let ids: Vec<String> = current_scope(ui)
                .map(|s| s.floors.iter().map(|f| f.id.clone()).collect())
                .unwrap_or_default();
            // Slot 0 is "(none)".
            let pos = ui
                .wizard
                .draft
                .floor
                .as_ref()
                .and_then(|f| ids.iter().position(|id| id == f))
                .map(|i| i + 1)
                .unwrap_or(0);
            let next = cycle_index(Some(pos), ids.len() + 1, forward);
            ui.wizard.draft.floor = next.checked_sub(1).and_then(|i| ids.get(i)).cloned();
        }
        FieldId::Unit => {
            let pos = UNITS.iter().position(|u| *u == ui.wizard.draft.unit);
            ui.wizard.draft.unit = UNITS[cycle_index(pos, UNITS.len(), forward)].to_string();
        }
        _ => return,
    }
    ui.wizard.dismiss_error();
}

/// Current draft value rendered as editable text.
fn draft_text(ui: &UiState, field: FieldId) -> String {
    let d = &ui.wizard.draft;
    match field {
        FieldId::Name => d.name.clone(),
        FieldId::Description => d.description.clone(),
        FieldId::CustomUnit => d.custom_unit.clone(),
        FieldId::Supplier => d.supplier_name.clone(),
        FieldId::ReceivedBy => d.material_received_by.clone(),
        FieldId::RetroNotes => d.retroactive_notes.clone(),
        FieldId::Quantity => d.quantity.map(format_quantity).unwrap_or_default(),
        FieldId::UnitCost => d.unit_cost.map(format_quantity).unwrap_or_default(),
        FieldId::EstimatedUnitCost => d.estimated_unit_cost.map(format_quantity).unwrap_or_default(),
        FieldId::PurchaseDate => d
            .purchase_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        FieldId::ReceiptUrl => d.receipt_file_url.clone().unwrap_or_default(),
        FieldId::InvoiceUrl => d.invoice_file_url.clone().unwrap_or_default(),
        FieldId::DeliveryNoteUrl => d.delivery_note_file_url.clone().unwrap_or_default(),
        FieldId::Finishing(i) => active_finishing(ui)
            .and_then(|k| k.fields().get(i))
            .and_then(|f| d.finishing_details.get(f.key))
            .cloned()
            .unwrap_or_default(),
        FieldId::Project | FieldId::Category | FieldId::Phase | FieldId::Floor | FieldId::Unit => {
            String::new()
        }
    }
}

fn store_parsed<T>(
    errors: &mut HashMap<FieldId, String>,
    field: FieldId,
    parsed: std::result::Result<Option<T>, String>,
    slot: &mut Option<T>,
) {
    match parsed {
        Ok(value) => {
            *slot = value;
            errors.remove(&field);
        }
        Err(e) => {
            *slot = None;
            errors.insert(field, e);
        }
    }
}

/// Write an edited text field back into the draft.
fn commit_text(ui: &mut UiState, field: FieldId, value: &str) {
    let finishing_key = match field {
        FieldId::Finishing(i) => active_finishing(ui)
            .and_then(|k| k.fields().get(i))
            .map(|f| f.key),
        _ => None,
    };

    let errors = &mut ui.field_errors;
    let d = &mut ui.wizard.draft;
    match field {
        FieldId::Name => d.name = value.to_string(),
        FieldId::Description => d.description = value.to_string(),
        FieldId::CustomUnit => d.custom_unit = value.to_string(),
        FieldId::Supplier => d.supplier_name = value.to_string(),
        FieldId::ReceivedBy => d.material_received_by = value.to_string(),
        FieldId::RetroNotes => d.retroactive_notes = value.to_string(),
        FieldId::Quantity => store_parsed(errors, field, parse_decimal(value), &mut d.quantity),
        FieldId::UnitCost => store_parsed(errors, field, parse_decimal(value), &mut d.unit_cost),
        FieldId::EstimatedUnitCost => store_parsed(
            errors,
            field,
            parse_decimal(value),
            &mut d.estimated_unit_cost,
        ),
        FieldId::PurchaseDate => {
            store_parsed(errors, field, parse_date(value), &mut d.purchase_date)
        }
        FieldId::ReceiptUrl => d.receipt_file_url = optional_text(value),
        FieldId::InvoiceUrl => d.invoice_file_url = optional_text(value),
        FieldId::DeliveryNoteUrl => d.delivery_note_file_url = optional_text(value),
        FieldId::Finishing(_) => {
            if let Some(key) = finishing_key {
                ui.wizard.set_finishing_field(key, value);
            }
        }
        FieldId::Project | FieldId::Category | FieldId::Phase | FieldId::Floor | FieldId::Unit => {}
    }
    ui.wizard.dismiss_error();
}

// -----------------------------------------------------------------------------
// Keys
// -----------------------------------------------------------------------------

fn handle_key(ui: &mut UiState, code: KeyCode) {
    // Modal handling
    if let Some(modal) = ui.modal.clone() {
        match modal {
            Modal::ConfirmCancel { return_focus } => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    let next = match focused_button(ui) {
                        ButtonFocus::Cancel => ButtonFocus::Next,
                        _ => ButtonFocus::Cancel,
                    };
                    ui.focus = FocusTarget::Button(next);
                }
                KeyCode::Enter => {
                    let confirm = focused_button(ui) == ButtonFocus::Cancel;
                    ui.modal = None;
                    if confirm {
                        info!("[PHASE: wizard] [STEP: cancel] Material entry discarded by user");
                        ui.quit = true;
                    } else {
                        ui.focus = return_focus;
                    }
                }
                KeyCode::Esc => {
                    ui.modal = None;
                    ui.focus = return_focus;
                }
                _ => {}
            },
            Modal::Message { .. } => {
                if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                    ui.modal = None;
                }
            }
        }
        return;
    }

    // Global keys
    if code == KeyCode::Esc && can_cancel(ui) {
        open_cancel_modal(ui);
        return;
    }

    if let FocusTarget::Field(field) = ui.focus {
        if field.is_choice() {
            if let KeyCode::Left | KeyCode::Right = code {
                cycle_choice(ui, field, code == KeyCode::Right);
                return;
            }
        } else {
            let seed = draft_text(ui, field);
            let input = ui
                .inputs
                .entry(field)
                .or_insert_with(|| TextInput::new(seed));
            if input.handle_key(code) {
                let value = input.value.clone();
                commit_text(ui, field, &value);
                return;
            }
        }
    }

    let page = current_page(ui);
    match code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right
            if page == Page::ChooseEntryType =>
        {
            ui.entry_choice = ui.entry_choice.toggle();
        }
        KeyCode::Char('e') | KeyCode::Char('E') if page == Page::NewPurchaseNotice => {
            if ui.wizard.emergency_override() {
                warn!(
                    "[PHASE: wizard] [STEP: emergency_override] New purchase recorded as retroactive entry"
                );
                focus_first(ui);
                ui.modal = Some(Modal::Message {
                    title: "Emergency override".to_string(),
                    body: "This material will be recorded directly as a retroactive entry. \
                           The original new-purchase choice stays on the record."
                        .to_string(),
                });
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') if page == Page::Complete => {
            reset_for_another(ui);
        }
        KeyCode::Char('x') | KeyCode::Char('X') => ui.wizard.dismiss_error(),
        KeyCode::Up | KeyCode::Down if matches!(ui.focus, FocusTarget::Field(_)) => {
            move_field_focus(ui, code == KeyCode::Down);
        }
        KeyCode::Tab => cycle_focus(ui, true),
        KeyCode::BackTab => cycle_focus(ui, false),
        KeyCode::Enter => match focused_button(ui) {
            ButtonFocus::Back => {
                if can_go_back(ui) {
                    go_back(ui);
                }
            }
            ButtonFocus::Next => {
                if can_go_next(ui) {
                    go_next(ui);
                }
            }
            ButtonFocus::Cancel => {
                if can_cancel(ui) {
                    open_cancel_modal(ui);
                }
            }
        },
        _ => {}
    }
}

// -----------------------------------------------------------------------------
// Display helpers
// -----------------------------------------------------------------------------

fn project_name(ui: &UiState, id: &str) -> String {
    ui.lookups
        .projects
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn phase_name(ui: &UiState, id: &str) -> String {
    current_scope(ui)
        .and_then(|s| s.phases.iter().find(|p| p.id == id))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn floor_name(ui: &UiState, id: &str) -> String {
    current_scope(ui)
        .and_then(|s| s.floors.iter().find(|f| f.id == id))
        .map(|f| f.display_name())
        .unwrap_or_else(|| id.to_string())
}

fn field_label(ui: &UiState, field: FieldId) -> String {
    let label = match field {
        FieldId::Project => "Project *",
        FieldId::Name => "Material name *",
        FieldId::Description => "Description",
        FieldId::Category => "Category",
        FieldId::Phase => "Phase *",
        FieldId::Floor => "Floor",
        FieldId::Quantity => "Quantity *",
        FieldId::Unit => "Unit *",
        FieldId::CustomUnit => "Custom unit *",
        FieldId::UnitCost => "Unit cost",
        FieldId::EstimatedUnitCost => "Estimated unit cost",
        FieldId::Supplier => "Supplier",
        FieldId::PurchaseDate => "Purchase date",
        FieldId::ReceivedBy => "Received by",
        FieldId::RetroNotes => "Notes",
        FieldId::ReceiptUrl => "Receipt URL",
        FieldId::InvoiceUrl => "Invoice URL",
        FieldId::DeliveryNoteUrl => "Delivery note URL",
        FieldId::Finishing(i) => {
            return active_finishing(ui)
                .and_then(|k| k.fields().get(i))
                .map(|f| {
                    if f.required {
                        format!("{} *", f.label)
                    } else {
                        f.label.to_string()
                    }
                })
                .unwrap_or_default();
        }
    };
    label.to_string()
}

fn choice_display(ui: &UiState, field: FieldId) -> String {
    let d = &ui.wizard.draft;
    match field {
        FieldId::Project => {
            if !d.project_id.is_empty() {
                project_name(ui, &d.project_id)
            } else if !ui.lookups_loaded {
                "loading...".to_string()
            } else if ui.lookups.projects.is_empty() {
                "(no projects available)".to_string()
            } else {
                "(select)".to_string()
            }
        }
        FieldId::Category => resolve_category_name(d, &ui.lookups.categories)
            .unwrap_or_else(|| "(none)".to_string()),
        FieldId::Phase => {
            if d.project_id.is_empty() {
                "(select a project first)".to_string()
            } else if !d.phase_id.is_empty() {
                phase_name(ui, &d.phase_id)
            } else if ui.scope_loading {
                "loading...".to_string()
            } else if current_scope(ui).map(|s| s.phases.is_empty()).unwrap_or(true) {
                "(no phases for this project)".to_string()
            } else {
                "(select)".to_string()
            }
        }
        FieldId::Floor => d
            .floor
            .as_deref()
            .map(|f| floor_name(ui, f))
            .unwrap_or_else(|| "(none)".to_string()),
        FieldId::Unit => {
            if d.unit.is_empty() {
                "(select)".to_string()
            } else {
                d.unit.clone()
            }
        }
        _ => String::new(),
    }
}

fn push_field(lines: &mut Vec<Line<'static>>, ui: &UiState, field: FieldId) {
    let focused = ui.focus == FocusTarget::Field(field);
    let prefix = if focused { ">" } else { " " };
    let label_style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let value = if field.is_choice() {
        format!("< {} >", choice_display(ui, field))
    } else {
        match ui.inputs.get(&field) {
            Some(input) if focused => input.display_with_cursor(),
            Some(input) => input.value.clone(),
            None if focused => format!("{}|", draft_text(ui, field)),
            None => draft_text(ui, field),
        }
    };

    lines.push(Line::from(vec![
        Span::styled(
            format!("{} {:<22}", prefix, format!("{}:", field_label(ui, field))),
            label_style,
        ),
        Span::raw(value),
    ]));
    if let Some(err) = ui.field_errors.get(&field) {
        lines.push(Line::from(Span::styled(
            format!("    {}", err),
            Style::default().fg(Color::Red),
        )));
    }
}

fn cost_status_label(status: CostStatus) -> &'static str {
    match status {
        CostStatus::Provided => "provided",
        CostStatus::Estimated => "estimated",
        CostStatus::Missing => "missing (can be added later)",
    }
}

fn is_override(ui: &UiState) -> bool {
    ui.wizard.selected_entry_type == Some(EntryType::NewPurchase)
        && ui.wizard.entry_type == Some(EntryType::RetroactiveEntry)
}

fn page_lines(ui: &UiState, page: Page) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    match page {
        Page::ChooseEntryType => {
            lines.push(Line::from("How is this material being added?"));
            lines.push(Line::from(""));
            for t in [EntryType::RetroactiveEntry, EntryType::NewPurchase] {
                let mark = if ui.entry_choice == t { "(x)" } else { "( )" };
                lines.push(Line::from(format!("{} {}", mark, t.label())));
            }
            lines.push(Line::from(""));
            if !ui.lookups_loaded {
                lines.push(Line::from("Loading projects and categories..."));
                lines.push(Line::from(""));
            }
            lines.push(Line::from("Up/Down to change selection, Enter to continue."));
        }
        Page::NewPurchaseNotice => {
            lines.push(Line::from(
                "New purchases go through a purchase request and approval.",
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(
                "Raise a request from the Requests page; the material is recorded once it is delivered.",
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Material already on site and must be recorded now? Press E for an emergency override.",
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from("Back returns to the entry type choice."));
        }
        Page::Step(step) => {
            for field in page_fields(ui) {
                if field == FieldId::ReceiptUrl {
                    lines.push(Line::from("Documents are optional."));
                }
                if field == FieldId::Finishing(0) {
                    if let Some(kind) = active_finishing(ui) {
                        lines.push(Line::from(""));
                        lines.push(Line::from(Span::styled(
                            kind.title().to_string(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )));
                    }
                }
                push_field(&mut lines, ui, field);
            }
            match step {
                Step::Three => {
                    lines.push(Line::from(""));
                    lines.push(Line::from(
                        "Costs are optional for retroactive entries; leave blank if unknown.",
                    ));
                    lines.push(Line::from(format!(
                        "Running total: {}{}",
                        ui.currency_symbol,
                        ui.wizard.calculate_total()
                    )));
                }
                Step::Five => review_lines(ui, &mut lines),
                _ => {}
            }
            if step != Step::Five {
                lines.push(Line::from(""));
                lines.push(Line::from(
                    "Tab/Up/Down move between fields, Left/Right change a selection, Enter continues.",
                ));
            }
        }
        Page::Complete => {
            if let Some(outcome) = ui.outcome.as_ref() {
                lines.push(Line::from(Span::styled(
                    "Material saved.",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(format!("Material ID: {}", outcome.material_id)));
                lines.push(Line::from(format!(
                    "Open in the web app: {}",
                    outcome.detail_path
                )));
                if let Some(w) = outcome.capital_warning.as_deref() {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        format!("Capital warning: {}", w),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            lines.push(Line::from(""));
            lines.push(Line::from(
                "Press N to record another material, or Finish to exit.",
            ));
        }
    }
    lines
}

fn review_lines(ui: &UiState, lines: &mut Vec<Line<'static>>) {
    let d = &ui.wizard.draft;
    let symbol = ui.currency_symbol.as_str();
    let or_dash = |s: &str| {
        if s.trim().is_empty() {
            "-".to_string()
        } else {
            s.trim().to_string()
        }
    };
    let money = |v: Option<f64>| {
        v.map(|v| format_currency(v, symbol))
            .unwrap_or_else(|| "not provided".to_string())
    };

    let mode = match ui.wizard.selected_entry_type {
        Some(t) if is_override(ui) => format!("{} (emergency override)", t.label()),
        Some(t) => t.label().to_string(),
        None => "-".to_string(),
    };
    let documents = [
        &d.receipt_file_url,
        &d.invoice_file_url,
        &d.delivery_note_file_url,
    ]
    .iter()
    .filter(|u| u.is_some())
    .count();

    let rows = [
        ("Entry type", mode),
        ("Project", project_name(ui, &d.project_id)),
        ("Material", or_dash(&d.name)),
        ("Description", or_dash(&d.description)),
        (
            "Category",
            resolve_category_name(d, &ui.lookups.categories).unwrap_or_else(|| "-".to_string()),
        ),
        ("Phase", phase_name(ui, &d.phase_id)),
        (
            "Floor",
            d.floor
                .as_deref()
                .map(|f| floor_name(ui, f))
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Quantity",
            format!(
                "{} {}",
                d.quantity.map(format_quantity).unwrap_or_default(),
                d.resolved_unit()
            ),
        ),
        ("Unit cost", money(d.unit_cost)),
        ("Estimated unit cost", money(d.estimated_unit_cost)),
        ("Supplier", or_dash(&d.supplier_name)),
        (
            "Purchase date",
            d.purchase_date
                .map(format_date)
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Received by", or_dash(&d.material_received_by)),
        ("Notes", or_dash(&d.retroactive_notes)),
        ("Documents", format!("{} attached", documents)),
        ("Cost status", cost_status_label(cost_status(d)).to_string()),
    ];
    for (label, value) in rows {
        lines.push(Line::from(format!("{:<21}{}", format!("{}:", label), value)));
    }

    if let Some(kind) = active_finishing(ui) {
        lines.push(Line::from(""));
        lines.push(Line::from(kind.title().to_string()));
        for f in kind.fields() {
            if let Some(v) = d.finishing_details.get(f.key).filter(|v| !v.trim().is_empty()) {
                lines.push(Line::from(format!("  {}: {}", f.label, v.trim())));
            }
        }
        let missing = kind.missing_required(&d.finishing_details);
        if !missing.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  Not filled in yet: {}", missing.join(", ")),
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Total: {}", format_currency(total_amount(d), symbol)),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if ui.submitting {
        lines.push(Line::from("Submitting..."));
    }
}

// -----------------------------------------------------------------------------
// Drawing
// -----------------------------------------------------------------------------

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, ui: &UiState) {
    let page = current_page(ui);
    let window_area = centered_window(area, 100, 30);

    let outer_block = Block::default().borders(Borders::ALL).title("Add Material");
    f.render_widget(outer_block, window_area);

    let inner = window_area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    let banner_height = if ui.wizard.error.is_some() { 1 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(banner_height),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(inner);

    let header = match page {
        Page::Step(step) => format!("Step {} of {}  |  {}", step.number(), Step::ALL.len(), step.title()),
        other => page_title(other).to_string(),
    };
    f.render_widget(
        Paragraph::new(header).style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    if let Some(err) = ui.wizard.error.as_deref() {
        let banner = Paragraph::new(format!("! {}  (x to dismiss)", err))
            .style(Style::default().fg(Color::White).bg(Color::Red));
        f.render_widget(banner, rows[1]);
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)].as_ref())
        .split(rows[2]);

    draw_step_panel(f, cols[0], ui, page);

    let content_block = Block::default().borders(Borders::ALL).title(page_title(page));
    f.render_widget(content_block, cols[1]);
    let content_inner = cols[1].inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    let content = Paragraph::new(Text::from(page_lines(ui, page)))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    f.render_widget(content, content_inner);

    draw_toast(f, rows[3], ui);
    draw_buttons(f, rows[4], ui, page);

    if let Some(modal) = ui.modal.as_ref() {
        match modal {
            Modal::ConfirmCancel { .. } => draw_cancel_modal(f, window_area, ui),
            Modal::Message { title, body } => draw_message_modal(f, window_area, title, body),
        }
    }
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn draw_step_panel(f: &mut ratatui::Frame<'_>, area: Rect, ui: &UiState, page: Page) {
    let mut lines = vec![Line::from("")];
    for step in Step::ALL {
        let marker = match page {
            Page::Step(current) if current == step => ">",
            Page::Step(current) if step < current => "*",
            Page::Complete => "*",
            _ => " ",
        };
        lines.push(Line::from(format!(
            "{} {}. {}",
            marker,
            step.number(),
            step.title()
        )));
    }

    lines.push(Line::from(""));
    if let Some(t) = ui.wizard.selected_entry_type {
        let mode = match t {
            EntryType::RetroactiveEntry => "Retroactive",
            EntryType::NewPurchase => "New purchase",
        };
        lines.push(Line::from(format!("Mode: {}", mode)));
        if is_override(ui) {
            lines.push(Line::from(Span::styled(
                "Emergency override",
                Style::default().fg(Color::Yellow),
            )));
        }
    }
    if !ui.lookups_loaded {
        lines.push(Line::from("Loading lookups..."));
    }
    if ui.scope_loading {
        lines.push(Line::from("Loading floors/phases..."));
    }

    let panel = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Steps"))
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn draw_toast(f: &mut ratatui::Frame<'_>, area: Rect, ui: &UiState) {
    let Some(toast) = ui.toasts.last() else {
        return;
    };
    let color = match toast.kind {
        ToastKind::Success => Color::Green,
        ToastKind::Warning => Color::Yellow,
        ToastKind::Error => Color::Red,
    };
    let p = Paragraph::new(toast.text.clone()).style(Style::default().fg(color));
    f.render_widget(p, area);
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, ui: &UiState, page: Page) {
    let back = button_text(
        "Back",
        ui.focus == FocusTarget::Button(ButtonFocus::Back),
        can_go_back(ui),
    );
    let next = button_text(
        next_label(page),
        ui.focus == FocusTarget::Button(ButtonFocus::Next),
        can_go_next(ui),
    );
    let cancel = button_text(
        "Cancel",
        ui.focus == FocusTarget::Button(ButtonFocus::Cancel),
        can_cancel(ui),
    );

    let line = Line::from(vec![back, Span::raw(" "), next, Span::raw(" "), cancel]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn modal_area(window_area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(window_area.width.saturating_sub(4));
    let h = height.min(window_area.height.saturating_sub(4));
    Rect {
        x: window_area.x + (window_area.width.saturating_sub(w)) / 2,
        y: window_area.y + (window_area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn modal_buttons_area(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    }
}

fn draw_cancel_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, ui: &UiState) {
    let area = modal_area(window_area, 60, 7);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Discard material entry?");
    let body = Paragraph::new(Text::from(vec![Line::from(
        "Nothing has been saved. Leaving now discards everything entered so far.",
    )]))
    .block(block)
    .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    let yes = button_text("Yes, discard", focused_button(ui) == ButtonFocus::Cancel, true);
    let no = button_text("No", focused_button(ui) == ButtonFocus::Next, true);
    let line = Line::from(vec![yes, Span::raw(" "), no]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

fn draw_message_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, title: &str, body: &str) {
    let area = modal_area(window_area, 64, 8);
    f.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let p = Paragraph::new(Text::from(body.to_string()))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);

    let ok = button_text("OK", true, true);
    let p = Paragraph::new(Text::from(Line::from(vec![ok]))).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}
