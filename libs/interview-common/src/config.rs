// Application and session configuration
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/interview.json";

/// Roles that include the coding round
pub const TECHNICAL_ROLES: [&str; 2] = ["Software Engineer", "Data Scientist"];

/// Per-session interview settings, fixed for the session lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub role: String,
    pub level: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default = "default_technical_roles")]
    pub technical_roles: Vec<String>,
}

impl SessionConfig {
    pub fn new(role: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            level: level.into(),
            company: None,
            job_description: None,
            technical_roles: default_technical_roles(),
        }
    }

    pub fn with_company(mut self, company: Option<String>) -> Self {
        self.company = non_blank(company);
        self
    }

    pub fn with_job_description(mut self, jd: Option<String>) -> Self {
        self.job_description = non_blank(jd);
        self
    }

    pub fn with_technical_roles(mut self, roles: Vec<String>) -> Self {
        self.technical_roles = roles;
        self
    }

    /// Whether the coding/DSA path is reachable for this role
    pub fn is_technical(&self) -> bool {
        self.technical_roles.iter().any(|r| r == self.role.trim())
    }

    /// Normalize blank optional fields (e.g. after deserializing user input)
    pub fn normalized(self) -> Self {
        let company = self.company.clone();
        let jd = self.job_description.clone();
        self.with_company(company).with_job_description(jd)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_technical_roles() -> Vec<String> {
    TECHNICAL_ROLES.iter().map(|r| r.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraderBackend {
    Process,
    Docker,
}

impl FromStr for GraderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "process" => Ok(GraderBackend::Process),
            "docker" => Ok(GraderBackend::Docker),
            _ => bail!("Unknown grader backend '{}'", s.trim()),
        }
    }
}

impl GraderBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraderBackend::Process => "process",
            GraderBackend::Docker => "docker",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    pub backend: GraderBackend,
    pub python_bin: String,
    pub image: String,
    pub timeout_ms: u64,
    pub memory_limit_mb: u32,
    pub cpu_limit: f32,
    pub pids_limit: i64,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            backend: GraderBackend::Process,
            python_bin: "python3".to_string(),
            image: "python:3.12-alpine".to_string(),
            timeout_ms: 5000,
            memory_limit_mb: 256,
            cpu_limit: 0.5,
            pids_limit: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub transcription_model: String,
    /// Fall back to keyword matching when the reply carries no phase directive
    pub keyword_fallback: bool,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
            max_retries: 3,
            transcription_model: "whisper-large-v3".to_string(),
            keyword_fallback: true,
        }
    }
}

/// How long the API keeps sessions around
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Sessions untouched for this long are discarded
    pub idle_ttl_secs: u64,
    /// Shorter expiry for sessions that already reached feedback
    pub finished_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 3600,
            finished_ttl_secs: 600,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionLimits {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn finished_ttl(&self) -> Duration {
        Duration::from_secs(self.finished_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Process-wide configuration loaded from `config/interview.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub grader: GraderConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default = "default_technical_roles")]
    pub technical_roles: Vec<String>,
    #[serde(default)]
    pub sessions: SessionLimits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grader: GraderConfig::default(),
            dialogue: DialogueConfig::default(),
            technical_roles: default_technical_roles(),
            sessions: SessionLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Interview config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `INTERVIEW_CONFIG` or the default path, falling back to
    /// built-in defaults when no file exists. Env overrides are applied last.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var("INTERVIEW_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);

        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(backend) = std::env::var("GRADER_BACKEND") {
            config.grader.backend = backend
                .parse::<GraderBackend>()
                .context("Invalid GRADER_BACKEND")?;
        }

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.grader.timeout_ms == 0 {
            bail!("grader.timeout_ms must be greater than zero");
        }
        if self.grader.memory_limit_mb == 0 {
            bail!("grader.memory_limit_mb must be greater than zero");
        }
        if self.sessions.sweep_interval_secs == 0 {
            bail!("sessions.sweep_interval_secs must be greater than zero");
        }
        if self.technical_roles.is_empty() {
            tracing::warn!("No technical roles configured; coding round is disabled for every role");
        }
        Ok(())
    }

    /// Build a session config that uses this process's technical role list
    pub fn session(&self, role: &str, level: &str) -> SessionConfig {
        SessionConfig::new(role, level).with_technical_roles(self.technical_roles.clone())
    }
}
