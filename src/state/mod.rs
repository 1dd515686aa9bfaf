//! State management module
//!
//! In-process conversational state: wizard sessions, pending dialogs,
//! catalog filters and tracked message ids.

pub mod context;
pub mod session;
pub mod steps;
pub mod storage;
pub mod wizard;

// Re-export commonly used state components
pub use context::{AppContext, Dialog, DialogStore, DisplayState, DisplayTracker, FilterStore};
pub use session::{FieldValue, Session, SessionStore, WizardMode, WizardPhase};
pub use steps::{StepDescriptor, StepKind, LISTING_STEPS};
pub use storage::{MemoryStore, StorageStats};
pub use wizard::{CommitOutcome, PreviewSummary, StepInput, StepPrompt, WizardEngine, WizardReply};
