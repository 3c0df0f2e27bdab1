//! Crossover assignment and the per-participant session state machine.

pub mod assign;
pub mod clock;
pub mod manifest;
pub mod session;
pub mod snapshot;

pub use assign::{
    assign, phase_plan, plan_hash, plan_session, split_bank, Assignment, DesignParams, SplitKind,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use manifest::SessionManifest;
pub use session::{ParticipantForm, QuestionView, Session, SessionState, SurveyProtocol};
pub use snapshot::{Resumed, SessionSnapshot, SNAPSHOT_VERSION};
