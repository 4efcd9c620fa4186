//! UI state layer: presentation-independent state machine and
//! orchestration.
//!
//! No rendering happens here. The form states and the pure projection
//! describe *what* is visible; drawing it is the embedding front end's
//! concern.

mod app;
mod forms;
mod projection;
mod worker;

pub use app::App;
pub use forms::{AuthFormState, FormMode, PatientFormState};
pub use projection::{project, SessionUiState, UiProjection};
pub use worker::{
    AuthOutcome, AuthTaskHandle, AuthWorker, RecordsEvent, UpsertOutcome, UpsertTaskHandle,
    UpsertWorker,
};
