//! Flow Orchestration Layer
//!
//! Drives the assignment site end to end on top of the action primitives: operator
//! login, enumeration of the assignment list inside the content frame, the per-item
//! workflow state machine and the run loop that tallies outcomes.

pub mod context;
pub mod enumerator;
pub mod errors;
pub mod executor;
pub mod login;
pub mod runner;
pub mod strategies;
pub mod types;

pub use context::FlowContext;
pub use enumerator::AssignmentEnumerator;
pub use errors::FlowError;
pub use executor::AssignmentWorkflow;
pub use login::{Credentials, LoginController, LoginMode, LoginOutcome, Operator};
pub use runner::RunController;
pub use strategies::{DefaultFailureHandler, FailureHandler};
pub use types::{
    AssignmentItem, AttemptState, ItemOutcome, ItemReport, RunSummary, RunTally, SiteProfile,
    StopReason, TimingProfile, WorkflowStage,
};
