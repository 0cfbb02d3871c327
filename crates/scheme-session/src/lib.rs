pub mod client;
pub mod errors;
pub mod form;
pub mod orchestrator;
pub mod prompt;
pub mod state;
pub mod view;

pub use client::{ChatBackend, ClientError, ProxyClient};
pub use form::{Field, FormDraft, FormProfile, FormStep};
pub use orchestrator::Orchestrator;
pub use state::{reduce, Action, AppState, Command, Screen};
