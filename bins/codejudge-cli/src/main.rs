mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codejudge_common::types::{JudgeMode, Language};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codejudge-cli")]
#[command(about = "Codejudge CLI - Browse problems, run and submit solutions", long_about = None)]
struct Cli {
    /// Base URL of the judge API
    #[arg(
        short,
        long,
        global = true,
        env = "CODEJUDGE_SERVER",
        default_value = "http://localhost:5000"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available problems
    Problems,

    /// Judge a solution against the visible test cases
    Run {
        /// Problem id
        #[arg(short, long)]
        problem: i64,

        /// Language (cpp, java, python, javascript)
        #[arg(short, long, value_parser = parse_language)]
        language: Language,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Judge a solution against all test cases, stopping at the first failure
    Submit {
        /// Problem id
        #[arg(short, long)]
        problem: i64,

        /// Language (cpp, java, python, javascript)
        #[arg(short, long, value_parser = parse_language)]
        language: Language,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Execute a program once with custom input
    Exec {
        /// Language (cpp, java, python, javascript)
        #[arg(short, long, value_parser = parse_language)]
        language: Language,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// File whose contents are passed as stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::parse(value).ok_or_else(|| {
        let known: Vec<String> = Language::ALL.iter().map(|l| l.to_string()).collect();
        format!(
            "unsupported language '{}' (expected one of: {})",
            value,
            known.join(", ")
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = commands::ApiClient::new(&cli.server)?;

    let success = match cli.command {
        Commands::Problems => {
            commands::list_problems(&client).await?;
            true
        }
        Commands::Run {
            problem,
            language,
            file,
        } => commands::judge(&client, JudgeMode::Run, problem, language, &file).await?,
        Commands::Submit {
            problem,
            language,
            file,
        } => commands::judge(&client, JudgeMode::Submit, problem, language, &file).await?,
        Commands::Exec {
            language,
            file,
            input,
        } => commands::exec(&client, language, &file, input.as_deref()).await?,
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}
