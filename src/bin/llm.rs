//! llm - command line front end for the orchestrator.
//!
//! Exit codes: 0 on success, 1 on validation/provider/other errors,
//! 130 when interrupted.

use std::future::Future;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, ValueEnum};
use llm_orchestrator::llm::{GenerationResponse, LlmError};
use llm_orchestrator::{Config, GenerationRequest, Orchestrator, OrchestratorOptions};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Mock,
    Ollama,
    Openai,
    Claude,
}

impl ProviderArg {
    fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Ollama => "ollama",
            Self::Openai => "openai",
            Self::Claude => "claude",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "llm",
    version,
    about = "LLM Multi-Provider CLI",
    after_help = "Examples:\n  \
        llm \"What is the capital of France?\"\n  \
        llm --provider mock \"Hello, world!\"\n  \
        llm --provider ollama --model llama3 \"Explain quantum computing\"\n  \
        llm --info"
)]
struct Cli {
    /// The prompt to generate from
    prompt: Option<String>,

    /// Provider to use (default: auto-detect)
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Model to use (provider-specific)
    #[arg(long)]
    model: Option<String>,

    /// Temperature parameter (0.0-2.0)
    #[arg(long)]
    temperature: Option<f64>,

    /// Show current provider information
    #[arg(long, default_value_t = false)]
    info: bool,

    /// Output in JSON format
    #[arg(long, default_value_t = false)]
    json: bool,
}

const SUCCESS: u8 = 0;
const FAILURE: u8 = 1;
const INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let work = async { report(execute(&cli).await) };
    ExitCode::from(run_until_interrupted(work, tokio::signal::ctrl_c()).await)
}

/// Drive `work` to completion unless `interrupt` fires first.
///
/// A failed signal listener is not an interrupt; `work` keeps running.
async fn run_until_interrupted<W, I>(work: W, interrupt: I) -> u8
where
    W: Future<Output = u8>,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(work);
    tokio::select! {
        code = &mut work => code,
        signal = interrupt => match signal {
            Ok(()) => {
                eprintln!("\nInterrupted");
                INTERRUPTED
            }
            Err(e) => {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                work.await
            }
        },
    }
}

/// Print a failure and map the outcome to an exit code.
fn report(result: Result<u8, CliError>) -> u8 {
    match result {
        Ok(code) => code,
        Err(CliError::Llm(LlmError::Validation(msg))) => {
            eprintln!("Validation error: {}", msg);
            FAILURE
        }
        Err(CliError::Llm(e @ LlmError::ProviderUnavailable { .. })) => {
            eprintln!("{}", e);
            FAILURE
        }
        Err(CliError::Llm(e)) => {
            eprintln!("Error: {}", e);
            FAILURE
        }
        Err(CliError::Other(e)) => {
            eprintln!("Error: {:#}", e);
            FAILURE
        }
    }
}

#[derive(Debug)]
enum CliError {
    Llm(LlmError),
    Other(anyhow::Error),
}

impl From<LlmError> for CliError {
    fn from(e: LlmError) -> Self {
        Self::Llm(e)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e)
    }
}

async fn execute(cli: &Cli) -> Result<u8, CliError> {
    let config = Config::from_env().map_err(anyhow::Error::from)?;
    let orchestrator = Orchestrator::new(
        OrchestratorOptions {
            provider: cli.provider.map(|p| p.as_str().to_string()),
            model: cli.model.clone(),
        },
        &config,
    )
    .await?;

    if cli.info {
        let info = orchestrator.provider_info();
        if cli.json {
            println!("{}", to_pretty(&info)?);
        } else {
            println!("Provider: {}", info.provider);
            println!("Model: {}", info.model);
        }
        return Ok(SUCCESS);
    }

    let Some(prompt) = cli.prompt.clone() else {
        let _ = Cli::command().print_help();
        return Ok(FAILURE);
    };

    let request = GenerationRequest {
        prompt,
        temperature: cli.temperature,
        ..GenerationRequest::default()
    };
    let response = orchestrator.generate(&request).await?;

    if cli.json {
        println!("{}", to_pretty(&response)?);
    } else {
        print_human(&response);
    }
    Ok(SUCCESS)
}

fn to_pretty<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn print_human(response: &GenerationResponse) {
    println!("Provider: {}", response.provider);
    println!("Model: {}", response.model);
    if response.fallback == Some(true) {
        println!("(Fallback to mock)");
    }
    println!("\n{}", response.content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_interrupt_exits_130() {
        let code = run_until_interrupted(std::future::pending::<u8>(), async { Ok(()) }).await;
        assert_eq!(code, INTERRUPTED);
    }

    #[tokio::test]
    async fn test_failed_signal_listener_is_not_an_interrupt() {
        let work = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            SUCCESS
        };
        let interrupt = async {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal driver"))
        };
        assert_eq!(run_until_interrupted(work, interrupt).await, SUCCESS);
    }

    #[tokio::test]
    async fn test_work_finishing_first_wins() {
        let code = run_until_interrupted(async { FAILURE }, std::future::pending()).await;
        assert_eq!(code, FAILURE);
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(report(Ok(SUCCESS)), SUCCESS);
        assert_eq!(report(Err(LlmError::validation("Prompt cannot be empty").into())), FAILURE);
        assert_eq!(report(Err(LlmError::unavailable("down").into())), FAILURE);
        assert_eq!(report(Err(LlmError::Internal("boom".to_string()).into())), FAILURE);
        assert_eq!(report(Err(anyhow::anyhow!("bad config").into())), FAILURE);
    }

    #[test]
    fn test_provider_flag_parses() {
        let cli = Cli::try_parse_from(["llm", "--provider", "claude", "Hi"]).unwrap();
        assert_eq!(cli.provider, Some(ProviderArg::Claude));
        assert_eq!(cli.prompt.as_deref(), Some("Hi"));
        assert!(Cli::try_parse_from(["llm", "--provider", "gemini", "Hi"]).is_err());
    }
}
