//! System prompts and synthetic instructions sent to the dialogue model

use crate::escalation::Verdict;
use crate::intent::LANGUAGE_SELECT_DIRECTIVE;
use anyhow::{Context, Result};
use handlebars::Handlebars;
use interview_common::config::SessionConfig;
use interview_common::types::{Message, MessageRole};
use serde_json::json;

const INTERVIEWER_PROMPT: &str = include_str!("../templates/interviewer.txt");
const ROLE_CONTEXT_TEMPLATE: &str = include_str!("../templates/role_context.hbs");

pub const START_INSTRUCTION: &str =
    "Start the interview now as Rachel and give a friendly welcome before asking the intro question.";

pub struct Prompts {
    handlebars: Handlebars<'static>,
}

impl Prompts {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Role-specific context derived from the session configuration
    pub fn role_context(&self, config: &SessionConfig) -> Result<String> {
        let data = json!({
            "role": config.role,
            "level": config.level,
            "company": config.company.as_deref().unwrap_or(""),
            "job_description": config.job_description.as_deref().unwrap_or(""),
            "technical": config.is_technical(),
            "directive": LANGUAGE_SELECT_DIRECTIVE,
        });

        let rendered = self
            .handlebars
            .render_template(ROLE_CONTEXT_TEMPLATE, &data)
            .context("Failed to render role context template")?;

        Ok(rendered.trim_end().to_string())
    }

    /// The two system messages that open every request
    pub fn system_messages(&self, config: &SessionConfig) -> Result<Vec<Message>> {
        Ok(vec![
            Message::system(INTERVIEWER_PROMPT.trim_end()),
            Message::system(self.role_context(config)?),
        ])
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::new()
    }
}

/// Instruction sent after a coding round ends
pub fn proceed_instruction(verdict: Verdict, attempts: u32) -> String {
    match verdict {
        Verdict::Revealed => format!(
            "The candidate did not solve sum_array after {} attempts and has been shown the reference \
             solution. Briefly encourage them, then continue the interview with the complexity and DSA \
             follow-up questions.",
            attempts
        ),
        _ => "The candidate's sum_array solution passed all hidden tests. Acknowledge it briefly, then \
              ask about the time and space complexity of their solution before moving on to a DSA question."
            .to_string(),
    }
}

/// Feedback request over the whole transcript
pub fn feedback_instruction(transcript: &[Message]) -> String {
    let lines: Vec<String> = transcript
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect();

    format!(
        "The candidate has ended the interview. Provide detailed feedback on this interview, structured as \
         strengths and areas for improvement with concrete advice:\n{}",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_context_mentions_directive() {
        let config = SessionConfig::new("Software Engineer", "Junior")
            .with_company(Some("Acme".to_string()));
        let context = Prompts::new().role_context(&config).unwrap();

        assert!(context.starts_with("The candidate is interviewing for the role of Software Engineer at the company 'Acme'."));
        assert!(context.contains("Experience level: Junior."));
        assert!(context.contains("TECHNICAL role"));
        assert!(context.contains(LANGUAGE_SELECT_DIRECTIVE));
        assert!(context.contains("No job description was provided"));
    }

    #[test]
    fn test_non_technical_context_has_no_coding() {
        let config = SessionConfig::new("Retail Associate", "Intern / Fresher")
            .with_job_description(Some("Handle <register> & returns".to_string()));
        let context = Prompts::new().role_context(&config).unwrap();

        assert!(context.contains("(company not specified)"));
        assert!(context.contains("NON-TECHNICAL role. Do not ask coding or DSA questions."));
        assert!(!context.contains(LANGUAGE_SELECT_DIRECTIVE));
        assert!(context.contains("Handle <register> & returns"));
    }

    #[test]
    fn test_system_messages() {
        let config = SessionConfig::new("Data Scientist", "Senior");
        let messages = Prompts::new().system_messages(&config).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.role == MessageRole::System));
        assert!(messages[0].content.contains("Rachel"));
    }

    #[test]
    fn test_feedback_instruction_lists_turns() {
        let transcript = vec![Message::assistant("Hi, I'm Rachel."), Message::user("Hi, I'm Sam.")];
        let text = feedback_instruction(&transcript);

        assert!(text.ends_with("assistant: Hi, I'm Rachel.\nuser: Hi, I'm Sam."));
    }
}
