// CLI commands for grading and terminal interviews
use anyhow::{bail, Context, Result};
use interview_common::config::{AppConfig, DEFAULT_CONFIG_PATH};
use interview_common::types::{GradingResult, Language, MessageRole};
use interview_core::{Action, InterviewController, InterviewSession, Phase, TurnOutcome};
use interview_grader::Grader;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Grade a source file with the configured backend
pub async fn grade_file(file: &str, json: bool) -> Result<()> {
    let source = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;

    let config = AppConfig::load_default()?;
    let grader = Grader::from_config(&config.grader)?;

    if !json {
        println!(
            "🧪 Grading {} against {} hidden cases ({} backend)",
            file,
            grader.suite().len(),
            grader.backend()
        );
    }

    let result = grader.evaluate(&source).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_grading(&result);
    }

    Ok(())
}

fn print_grading(result: &GradingResult) {
    if let Some(reason) = &result.failure {
        println!("❌ Could not run submission: {}", reason);
        return;
    }

    for row in &result.details {
        let mark = if row.passed { "✓" } else { "✗" };
        println!(
            "  {} #{} input {:?} → expected {}, got {}",
            mark, row.test_id, row.input, row.expected, row.actual
        );
    }

    if result.all_passed() {
        println!("✅ All tests passed ({}/{})", result.passed, result.total);
    } else {
        println!("⚠️  {}/{} tests passed", result.passed, result.total);
    }
}

/// One line of chat input
#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Text(String),
    Language(Language),
    Submit(PathBuf),
    Voice(PathBuf),
    End,
    Reset,
    Help,
    Quit,
    Invalid(String),
    Empty,
}

fn parse_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if !line.starts_with('/') {
        return ChatInput::Text(line.to_string());
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match (command, arg) {
        ("/lang", "") => ChatInput::Invalid("Usage: /lang <python|java|c++>".to_string()),
        ("/lang", name) => match name.parse() {
            Ok(language) => ChatInput::Language(language),
            Err(_) => ChatInput::Invalid(format!("Unknown language '{}'", name)),
        },
        ("/submit", "") => ChatInput::Invalid("Usage: /submit <path>".to_string()),
        ("/submit", path) => ChatInput::Submit(PathBuf::from(path)),
        ("/voice", "") => ChatInput::Invalid("Usage: /voice <audio.wav>".to_string()),
        ("/voice", path) => ChatInput::Voice(PathBuf::from(path)),
        ("/end", _) => ChatInput::End,
        ("/reset", _) => ChatInput::Reset,
        ("/help", _) => ChatInput::Help,
        ("/quit" | "/exit", _) => ChatInput::Quit,
        (other, _) => ChatInput::Invalid(format!("Unknown command '{}'. Type /help", other)),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /lang <python|java|c++>  Choose the coding language when asked");
    println!("  /submit <path>           Submit a source file during the coding round");
    println!("  /voice <audio.wav>       Send a recorded answer");
    println!("  /end                     End the interview and get feedback");
    println!("  /reset                   Start over");
    println!("  /quit                    Leave");
    println!("Anything else is sent as your answer.");
}

fn print_outcome(outcome: &TurnOutcome) {
    for message in &outcome.appended {
        if message.role == MessageRole::Assistant {
            println!("\n🧑‍💼 Rachel: {}\n", message.content);
        }
    }

    if let Some(grading) = &outcome.grading {
        print_grading(grading);
    }

    if let Some(notice) = &outcome.notice {
        println!("⚠️  {}", notice);
    }

    match &outcome.phase {
        Phase::LanguageSelect => println!("(choose a language with /lang <python|java|c++>)"),
        Phase::Coding(round) if outcome.grading.is_none() => {
            println!("(write sum_array in {} and submit it with /submit <path>)", round.language)
        }
        Phase::Feedback(feedback) => println!("\n📋 Feedback\n\n{}\n\n(/reset to start again, /quit to leave)", feedback),
        _ => {}
    }
}

/// Run an interactive session on stdin/stdout
pub async fn chat(role: &str, level: &str, company: Option<String>, job_description: Option<&str>) -> Result<()> {
    let config = AppConfig::load_default()?;
    let controller = InterviewController::from_config(&config)?;

    let job_description = match job_description {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("Failed to read job description {}", path))?,
        ),
        None => None,
    };

    let session_config = config
        .session(role, level)
        .with_company(company)
        .with_job_description(job_description);

    let technical = session_config.is_technical();
    let mut session = InterviewSession::new(session_config);

    println!("🎤 Mock interview: {} ({})", role, level);
    if !technical {
        println!("   Non-technical role: behavioral questions only");
    }
    println!("   Type /help for commands\n");

    run_action(&controller, &mut session, Action::Start).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let action = match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Help => {
                print_help();
                continue;
            }
            ChatInput::Quit => break,
            ChatInput::Invalid(message) => {
                println!("{}", message);
                continue;
            }
            ChatInput::Text(text) => Action::Text(text),
            ChatInput::Language(language) => Action::ChooseLanguage(language),
            ChatInput::End => Action::End,
            ChatInput::Reset => Action::Reset,
            ChatInput::Submit(path) => match fs::read_to_string(&path) {
                Ok(source) => Action::SubmitCode(source),
                Err(e) => {
                    println!("Could not read {}: {}", path.display(), e);
                    continue;
                }
            },
            ChatInput::Voice(path) => match fs::read(&path) {
                Ok(audio) => Action::Voice(audio),
                Err(e) => {
                    println!("Could not read {}: {}", path.display(), e);
                    continue;
                }
            },
        };

        let reset = action == Action::Reset;
        run_action(&controller, &mut session, action).await;

        if reset {
            println!("🔄 Session reset");
            run_action(&controller, &mut session, Action::Start).await;
        }
    }

    println!("👋 Goodbye");
    Ok(())
}

async fn run_action(controller: &InterviewController, session: &mut InterviewSession, action: Action) {
    match controller.handle(session, action).await {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => println!("⚠️  {}", e),
    }
}

/// Write `config/interview.json` with default settings
pub fn init_project(path: &str) -> Result<()> {
    let config_path = Path::new(path).join(DEFAULT_CONFIG_PATH);

    if config_path.exists() {
        bail!("Config already exists at {}", config_path.display());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(&AppConfig::default())
        .context("Failed to serialize default config")?;
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("✅ Wrote {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Put GROQ_API_KEY in your environment or a .env file");
    println!("  2. Grade a file: interview-cli grade --file solution.py");
    println!("  3. Practice: interview-cli chat --role \"Software Engineer\"");

    Ok(())
}
