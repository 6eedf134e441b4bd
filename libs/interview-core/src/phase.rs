//! Interview phases and the actions that move between them.
//!
//! Which actions are legal depends only on the current phase, so the check
//! is a single exhaustive match. Side effects live in the controller.

use crate::error::ControllerError;
use interview_common::types::Language;
use serde::Serialize;

/// An in-progress coding round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodingRound {
    pub language: Language,
    /// Graded submissions so far in this round
    pub attempts: u32,
}

impl CodingRound {
    pub fn new(language: Language) -> Self {
        Self { language, attempts: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Conversing,
    /// The interviewer has asked which programming language to use
    LanguageSelect,
    Coding(CodingRound),
    /// Terminal; holds the feedback text
    Feedback(String),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::NotStarted => "not_started",
            Phase::Conversing => "conversing",
            Phase::LanguageSelect => "language_select",
            Phase::Coding(_) => "coding",
            Phase::Feedback(_) => "feedback",
        }
    }

    pub fn coding_round(&self) -> Option<&CodingRound> {
        match self {
            Phase::Coding(round) => Some(round),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Feedback(_))
    }

    /// Whether `action` may be applied in this phase
    pub fn permits(&self, action: &Action) -> Result<(), ControllerError> {
        use Action::*;

        match (self, action) {
            (_, Reset) => Ok(()),
            (Phase::Feedback(_), _) => Err(ControllerError::SessionEnded),
            (Phase::NotStarted, Start) => Ok(()),
            (Phase::NotStarted, _) => Err(ControllerError::NotStarted),
            (_, Start) => Err(ControllerError::AlreadyStarted),
            (Phase::Coding(_), Voice(_)) => Err(ControllerError::VoiceDisabledDuringCoding),
            (_, Text(_) | Voice(_) | End) => Ok(()),
            (Phase::LanguageSelect, ChooseLanguage(_)) => Ok(()),
            (_, ChooseLanguage(_)) => Err(ControllerError::NotSelectingLanguage),
            (Phase::Coding(_), SubmitCode(_)) => Ok(()),
            (_, SubmitCode(_)) => Err(ControllerError::NotCoding),
        }
    }
}

/// Candidate-initiated events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Text(String),
    /// Recorded audio bytes
    Voice(Vec<u8>),
    ChooseLanguage(Language),
    SubmitCode(String),
    End,
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Text(_) => "text",
            Action::Voice(_) => "voice",
            Action::ChooseLanguage(_) => "choose_language",
            Action::SubmitCode(_) => "submit_code",
            Action::End => "end",
            Action::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coding() -> Phase {
        Phase::Coding(CodingRound::new(Language::Python))
    }

    #[test]
    fn test_not_started_only_accepts_start_and_reset() {
        let phase = Phase::NotStarted;
        assert!(phase.permits(&Action::Start).is_ok());
        assert!(phase.permits(&Action::Reset).is_ok());
        assert_eq!(phase.permits(&Action::Text("hi".into())), Err(ControllerError::NotStarted));
        assert_eq!(phase.permits(&Action::End), Err(ControllerError::NotStarted));
    }

    #[test]
    fn test_feedback_is_terminal() {
        let phase = Phase::Feedback("Well done".to_string());
        assert!(phase.is_terminal());
        assert_eq!(phase.permits(&Action::Text("more".into())), Err(ControllerError::SessionEnded));
        assert_eq!(phase.permits(&Action::End), Err(ControllerError::SessionEnded));
        assert_eq!(phase.permits(&Action::Start), Err(ControllerError::SessionEnded));
        assert!(phase.permits(&Action::Reset).is_ok());
    }

    #[test]
    fn test_language_choice_only_when_asked() {
        let choose = Action::ChooseLanguage(Language::Java);
        assert!(Phase::LanguageSelect.permits(&choose).is_ok());
        assert_eq!(Phase::Conversing.permits(&choose), Err(ControllerError::NotSelectingLanguage));
        assert_eq!(coding().permits(&choose), Err(ControllerError::NotSelectingLanguage));
    }

    #[test]
    fn test_submission_only_while_coding() {
        let submit = Action::SubmitCode("def sum_array(a): return 0".into());
        assert!(coding().permits(&submit).is_ok());
        assert_eq!(Phase::Conversing.permits(&submit), Err(ControllerError::NotCoding));
        assert_eq!(Phase::LanguageSelect.permits(&submit), Err(ControllerError::NotCoding));
    }

    #[test]
    fn test_voice_disabled_during_coding() {
        assert_eq!(
            coding().permits(&Action::Voice(vec![1, 2, 3])),
            Err(ControllerError::VoiceDisabledDuringCoding)
        );
        assert!(coding().permits(&Action::Text("Can arr be empty?".into())).is_ok());
        assert!(Phase::Conversing.permits(&Action::Voice(vec![1])).is_ok());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_value(coding()).unwrap();
        assert_eq!(json["phase"], "coding");
        assert_eq!(json["detail"]["language"], "python");
        assert_eq!(json["detail"]["attempts"], 0);

        let json = serde_json::to_value(Phase::Conversing).unwrap();
        assert_eq!(json["phase"], "conversing");
    }
}
