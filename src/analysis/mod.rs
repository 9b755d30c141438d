//! Semantic analysis over the project index: sessions, name resolution,
//! project state, and cancellation.

mod cancel;
mod project;
mod resolver;
mod session;

pub use cancel::CancellationToken;
pub use project::{IndexState, Project};
pub use resolver::{open_session, operator_function, ProjectSession, BINARY_OPERATOR_KINDS};
pub use session::{AnalysisSession, CallInfo, SessionError};
