// Material entry wizard
//
// `state` holds the pure step machine, `payload` turns a finished draft into the create request,
// `finishing` describes the category sub-forms and `session` drives the async collaborators.

pub mod finishing;
pub mod payload;
pub mod session;
pub mod state;

pub use finishing::FinishingKind;
pub use payload::build_payload;
pub use session::{Lookups, ProjectScope, SubmitOutcome};
pub use state::{advance, validate, Screen, Step, WizardState};
