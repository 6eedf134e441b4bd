//! Controller rejection and failure types

use thiserror::Error;

/// Why the controller refused or could not complete an action.
///
/// Every variant leaves the session exactly as it was before the action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("The interview has not started yet")]
    NotStarted,

    #[error("The interview has already started")]
    AlreadyStarted,

    #[error("The interview has ended; reset the session to start again")]
    SessionEnded,

    #[error("No coding round is in progress")]
    NotCoding,

    #[error("The interviewer has not asked for a programming language")]
    NotSelectingLanguage,

    #[error("Submitted code is empty")]
    EmptySubmission,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Voice input is disabled during the coding round")]
    VoiceDisabledDuringCoding,

    #[error("Code could not be graded: {0}")]
    Grading(String),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

impl ControllerError {
    /// The action is not valid in the session's current phase
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            ControllerError::NotStarted
                | ControllerError::AlreadyStarted
                | ControllerError::SessionEnded
                | ControllerError::NotCoding
                | ControllerError::NotSelectingLanguage
                | ControllerError::VoiceDisabledDuringCoding
        )
    }
}
