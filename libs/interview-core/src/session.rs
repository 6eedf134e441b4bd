use crate::phase::{CodingRound, Phase};
use chrono::{DateTime, Utc};
use interview_common::config::SessionConfig;
use interview_common::types::{GradingResult, Message};
use serde::Serialize;
use uuid::Uuid;

/// State of one candidate's interview.
///
/// Only the controller mutates a session; callers read it through the
/// accessors and hand it back by `&mut` for the next turn.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSession {
    id: Uuid,
    config: SessionConfig,
    transcript: Vec<Message>,
    phase: Phase,
    code: String,
    last_grading: Option<GradingResult>,
    created_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config: config.normalized(),
            transcript: Vec::new(),
            phase: Phase::NotStarted,
            code: String::new(),
            last_grading: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Last submitted source of the current coding round
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn last_grading(&self) -> Option<&GradingResult> {
        self.last_grading.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn feedback(&self) -> Option<&str> {
        match &self.phase {
            Phase::Feedback(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn begin_coding(&mut self, round: CodingRound) {
        self.code.clear();
        self.phase = Phase::Coding(round);
    }

    pub(crate) fn record_submission(&mut self, source: String, result: GradingResult) {
        self.code = source;
        self.last_grading = Some(result);
    }

    /// Leave the coding round; language, attempts and buffer are discarded
    pub(crate) fn exit_coding(&mut self) {
        self.code.clear();
        self.phase = Phase::Conversing;
    }

    /// Back to a fresh session with the same id and configuration
    pub(crate) fn reset(&mut self) {
        self.transcript.clear();
        self.phase = Phase::NotStarted;
        self.code.clear();
        self.last_grading = None;
    }
}
