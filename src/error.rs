use thiserror::Error;

use crate::ringing::model::ToolId;

/// Non-fatal conditions the coordinator degrades around. None of them
/// escape its public operations; they are logged and the step is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RingingError {
    #[error("no ringing entry for tool '{0}'")]
    MissingEntry(ToolId),

    #[error("{0} manager is not available")]
    MissingCollaborator(&'static str),

    #[error("render target '{0}' is not attached")]
    MissingRenderTarget(&'static str),
}
