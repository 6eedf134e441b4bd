/// Interview Controller - Turn Orchestration
///
/// **Responsibility:**
/// Apply one candidate action to a session: validate it against the phase,
/// call the collaborators it needs, append to the transcript and move the
/// phase.
///
/// **Guarantees:**
/// - A rejected action (`Err`) leaves the session untouched
/// - Dialogue and transcription failures never fail a turn; they surface
///   as a fallback reply or a notice
/// - Synthetic instructions (start, proceed, feedback) are sent to the
///   dialogue model but never stored in the transcript
/// - Grading finishes before the attempt counter moves

use crate::dialogue::{Dialogue, GroqDialogue, DIALOGUE_FALLBACK};
use crate::error::ControllerError;
use crate::escalation;
use crate::groq::GroqClient;
use crate::intent::{IntentDetector, PhaseIntent};
use crate::phase::{Action, CodingRound, Phase};
use crate::prompts::{self, Prompts, START_INSTRUCTION};
use crate::session::InterviewSession;
use crate::transcription::{GroqTranscriber, Transcriber};
use anyhow::Result;
use async_trait::async_trait;
use interview_common::config::AppConfig;
use interview_common::types::{GradingResult, Language, Message};
use interview_grader::Grader;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const TRANSCRIPTION_FAILED: &str = "Sorry, I couldn't catch that. Please try recording again.";

/// Grading seam so the controller can run against a scripted grader
#[async_trait]
pub trait CodeGrader: Send + Sync {
    async fn grade(&self, source: &str) -> Result<GradingResult>;
}

#[async_trait]
impl CodeGrader for Grader {
    async fn grade(&self, source: &str) -> Result<GradingResult> {
        self.evaluate(source).await
    }
}

/// What one handled action produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Transcript entries appended by this turn
    pub appended: Vec<Message>,
    /// User-facing text that is not part of the transcript
    pub notice: Option<String>,
    pub grading: Option<GradingResult>,
    pub phase: Phase,
    /// The dialogue model failed and a fallback was used
    pub dialogue_failed: bool,
    pub transcription_failed: bool,
}

#[derive(Default)]
struct Turn {
    notice: Option<String>,
    grading: Option<GradingResult>,
    dialogue_failed: bool,
    transcription_failed: bool,
}

pub struct InterviewController {
    dialogue: Arc<dyn Dialogue>,
    transcriber: Arc<dyn Transcriber>,
    grader: Arc<dyn CodeGrader>,
    detector: IntentDetector,
    prompts: Prompts,
}

impl InterviewController {
    pub fn new(
        dialogue: Arc<dyn Dialogue>,
        transcriber: Arc<dyn Transcriber>,
        grader: Arc<dyn CodeGrader>,
        detector: IntentDetector,
    ) -> Self {
        Self {
            dialogue,
            transcriber,
            grader,
            detector,
            prompts: Prompts::new(),
        }
    }

    /// Groq-backed collaborators and the configured grading backend
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Arc::new(GroqClient::from_env(&config.dialogue)?);
        let grader = Grader::from_config(&config.grader)?;

        Ok(Self::new(
            Arc::new(GroqDialogue::new(client.clone(), &config.dialogue)),
            Arc::new(GroqTranscriber::new(client, &config.dialogue)),
            Arc::new(grader),
            IntentDetector::new(config.dialogue.keyword_fallback),
        ))
    }

    /// Apply `action` to `session`
    #[instrument(skip(self, session, action), fields(session_id = %session.id(), action = action.name(), phase = session.phase().name()))]
    pub async fn handle(
        &self,
        session: &mut InterviewSession,
        action: Action,
    ) -> Result<TurnOutcome, ControllerError> {
        session.phase().permits(&action)?;

        let system = self
            .prompts
            .system_messages(session.config())
            .map_err(|e| ControllerError::Prompt(e.to_string()))?;

        let before = session.transcript().len();
        let mut turn = Turn::default();

        match action {
            Action::Reset => {
                session.reset();
                info!("Session reset");
            }
            Action::Start => self.start(session, &system, &mut turn).await,
            Action::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(ControllerError::EmptyMessage);
                }
                self.converse(session, &system, text.to_string(), &mut turn).await;
            }
            Action::Voice(audio) => match self.transcriber.transcribe(&audio).await {
                Ok(text) if !text.trim().is_empty() => {
                    self.converse(session, &system, text.trim().to_string(), &mut turn).await;
                }
                Ok(_) => {
                    warn!("Transcription was empty");
                    turn.notice = Some(TRANSCRIPTION_FAILED.to_string());
                    turn.transcription_failed = true;
                }
                Err(e) => {
                    warn!(transcriber = self.transcriber.name(), error = %e, "Transcription failed");
                    turn.notice = Some(TRANSCRIPTION_FAILED.to_string());
                    turn.transcription_failed = true;
                }
            },
            Action::ChooseLanguage(language) => {
                let text = format!("I'd like to use {}.", language);
                self.select_language(session, &system, language, text, &mut turn).await;
            }
            Action::SubmitCode(source) => self.submit(session, &system, source, &mut turn).await?,
            Action::End => self.end(session, &system, &mut turn).await,
        }

        let appended = session
            .transcript()
            .get(before..)
            .map(<[Message]>::to_vec)
            .unwrap_or_default();

        Ok(TurnOutcome {
            appended,
            notice: turn.notice,
            grading: turn.grading,
            phase: session.phase().clone(),
            dialogue_failed: turn.dialogue_failed,
            transcription_failed: turn.transcription_failed,
        })
    }

    async fn start(&self, session: &mut InterviewSession, system: &[Message], turn: &mut Turn) {
        let mut request = system.to_vec();
        request.push(Message::user(START_INSTRUCTION));

        match self.dialogue.reply(&request).await {
            Ok(reply) => {
                session.set_phase(Phase::Conversing);
                self.record_reply(session, &reply);
                info!(technical = session.config().is_technical(), "Interview started");
            }
            Err(e) => {
                // Nothing is recorded so the candidate can simply start again
                warn!(dialogue = self.dialogue.name(), error = %e, "Failed to start interview");
                turn.notice = Some(DIALOGUE_FALLBACK.to_string());
                turn.dialogue_failed = true;
            }
        }
    }

    async fn converse(&self, session: &mut InterviewSession, system: &[Message], text: String, turn: &mut Turn) {
        if matches!(session.phase(), Phase::LanguageSelect) {
            if let Ok(language) = text.parse::<Language>() {
                self.select_language(session, system, language, text, turn).await;
                return;
            }
        }

        session.push(Message::user(text));
        self.continue_dialogue(session, system, None, turn).await;
    }

    async fn select_language(
        &self,
        session: &mut InterviewSession,
        system: &[Message],
        language: Language,
        text: String,
        turn: &mut Turn,
    ) {
        if !language.is_gradable() {
            warn!(language = %language, "Submissions in this language are graded by the Python harness");
        }

        session.begin_coding(CodingRound::new(language));
        session.push(Message::user(text));
        info!(language = %language, "Coding round started");

        self.continue_dialogue(session, system, None, turn).await;
    }

    async fn submit(
        &self,
        session: &mut InterviewSession,
        system: &[Message],
        source: String,
        turn: &mut Turn,
    ) -> Result<(), ControllerError> {
        if source.trim().is_empty() {
            return Err(ControllerError::EmptySubmission);
        }

        let round = *session.phase().coding_round().ok_or(ControllerError::NotCoding)?;

        let result = self.grader.grade(&source).await.map_err(|e| {
            warn!(error = %e, "Grader unavailable; attempt not counted");
            ControllerError::Grading(e.to_string())
        })?;

        let attempt = round.attempts + 1;
        let review = escalation::review(&result, attempt, round.language);

        info!(
            attempt = attempt,
            passed = result.passed,
            total = result.total,
            verdict = review.verdict.as_str(),
            "Submission reviewed"
        );

        session.record_submission(source, result.clone());
        session.push(Message::assistant(review.message));
        turn.grading = Some(result);

        if review.verdict.ends_round() {
            session.exit_coding();
            let instruction = prompts::proceed_instruction(review.verdict, attempt);
            self.continue_dialogue(session, system, Some(instruction), turn).await;
        } else {
            session.set_phase(Phase::Coding(CodingRound {
                language: round.language,
                attempts: attempt,
            }));
        }

        Ok(())
    }

    async fn end(&self, session: &mut InterviewSession, system: &[Message], turn: &mut Turn) {
        let mut request = system.to_vec();
        request.push(Message::user(prompts::feedback_instruction(session.transcript())));

        match self.dialogue.reply(&request).await {
            Ok(reply) => {
                let (feedback, _) = self.detector.inspect(&reply);
                session.set_phase(Phase::Feedback(feedback));
                info!(turns = session.transcript().len(), "Interview ended");
            }
            Err(e) => {
                warn!(dialogue = self.dialogue.name(), error = %e, "Feedback request failed; session stays open");
                turn.notice = Some(DIALOGUE_FALLBACK.to_string());
                turn.dialogue_failed = true;
            }
        }
    }

    /// Ask for the next interviewer reply, optionally with a trailing
    /// instruction that is not stored.
    async fn continue_dialogue(
        &self,
        session: &mut InterviewSession,
        system: &[Message],
        instruction: Option<String>,
        turn: &mut Turn,
    ) {
        let mut request = system.to_vec();
        request.extend_from_slice(session.transcript());
        if let Some(instruction) = instruction {
            request.push(Message::user(instruction));
        }

        match self.dialogue.reply(&request).await {
            Ok(reply) => self.record_reply(session, &reply),
            Err(e) => {
                warn!(dialogue = self.dialogue.name(), error = %e, "Dialogue failed, using fallback reply");
                session.push(Message::assistant(DIALOGUE_FALLBACK));
                turn.dialogue_failed = true;
            }
        }
    }

    /// Store a reply and re-evaluate conversational phases against it
    fn record_reply(&self, session: &mut InterviewSession, reply: &str) {
        let (text, intent) = self.detector.inspect(reply);
        session.push(Message::assistant(text));

        if matches!(session.phase(), Phase::Conversing | Phase::LanguageSelect) {
            let asks_language =
                session.config().is_technical() && intent == Some(PhaseIntent::LanguageSelect);
            session.set_phase(if asks_language {
                Phase::LanguageSelect
            } else {
                Phase::Conversing
            });
        }
    }
}
