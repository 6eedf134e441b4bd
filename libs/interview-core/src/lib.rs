pub mod controller;
pub mod dialogue;
pub mod error;
pub mod escalation;
pub mod groq;
pub mod intent;
pub mod phase;
pub mod prompts;
pub mod session;
pub mod transcription;

pub use controller::{CodeGrader, InterviewController, TurnOutcome};
pub use error::ControllerError;
pub use phase::{Action, CodingRound, Phase};
pub use session::InterviewSession;
