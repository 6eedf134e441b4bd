use interview_core::{ControllerError, TurnOutcome};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref SESSIONS_CREATED_TOTAL: IntCounter =
        IntCounter::with_opts(Opts::new("interview_sessions_created_total", "Interview sessions created"))
            .expect("valid metric definition");

    pub static ref SESSIONS_EVICTED_TOTAL: IntCounter =
        IntCounter::with_opts(Opts::new("interview_sessions_evicted_total", "Expired sessions discarded by the sweeper"))
            .expect("valid metric definition");

    pub static ref CODE_SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("interview_code_submissions_total", "Graded code submissions by outcome"),
        &["outcome"]
    )
    .expect("valid metric definition");

    pub static ref DIALOGUE_FALLBACKS_TOTAL: IntCounter =
        IntCounter::with_opts(Opts::new("interview_dialogue_fallbacks_total", "Turns answered with the fallback reply"))
            .expect("valid metric definition");

    pub static ref TRANSCRIPTION_FAILURES_TOTAL: IntCounter =
        IntCounter::with_opts(Opts::new("interview_transcription_failures_total", "Voice turns that could not be transcribed"))
            .expect("valid metric definition");
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(SESSIONS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SESSIONS_EVICTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CODE_SUBMISSIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DIALOGUE_FALLBACKS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TRANSCRIPTION_FAILURES_TOTAL.clone()))?;
    Ok(())
}

/// Record counters for one handled action
pub fn observe(result: &Result<TurnOutcome, ControllerError>, submission: bool) {
    match result {
        Ok(outcome) => {
            if outcome.dialogue_failed {
                DIALOGUE_FALLBACKS_TOTAL.inc();
            }
            if outcome.transcription_failed {
                TRANSCRIPTION_FAILURES_TOTAL.inc();
            }
            if let Some(grading) = &outcome.grading {
                let label = if grading.all_passed() { "passed" } else { "failed" };
                CODE_SUBMISSIONS_TOTAL.with_label_values(&[label]).inc();
            }
        }
        Err(ControllerError::Grading(_)) if submission => {
            CODE_SUBMISSIONS_TOTAL.with_label_values(&["error"]).inc();
        }
        Err(_) => {}
    }
}

pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!(error = %e, "Could not encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
