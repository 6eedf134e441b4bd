mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "interview-cli")]
#[command(about = "Interview CLI - Practice interviews and grade sum_array submissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a source file against the hidden sum_array tests
    Grade {
        /// Path to the source file
        #[arg(short, long)]
        file: String,

        /// Print the result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Run an interactive interview in the terminal
    Chat {
        /// Role (e.g., "Software Engineer", "Sales Associate")
        #[arg(short, long)]
        role: String,

        /// Experience level (e.g., "Junior", "Senior")
        #[arg(short, long, default_value = "Junior")]
        level: String,

        /// Company name (optional)
        #[arg(short, long)]
        company: Option<String>,

        /// Path to a job description file (optional)
        #[arg(short, long)]
        job_description: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Project path
        #[arg(short, long, default_value = ".")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade { file, json } => {
            commands::grade_file(&file, json).await?;
        }
        Commands::Chat {
            role,
            level,
            company,
            job_description,
        } => {
            commands::chat(&role, &level, company, job_description.as_deref()).await?;
        }
        Commands::Init { path } => {
            commands::init_project(&path)?;
        }
    }

    Ok(())
}
