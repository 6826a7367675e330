//! AskAgent CLI
//!
//! Ask one question, or chat one question at a time. Progress is shown on
//! stderr while the agent works; the answer is typed out on stdout.

use askagent::agent::{validate_question, AgentLoop, LoopCallback, LoopTrace};
use askagent::config::{config_path, load_config, Config};
use askagent::logging::{init_logging, log_startup};
use askagent::typewriter::type_out;
use askagent::VERSION;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use console::{style, Term};
use std::io::{self, BufRead, Write};
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "askagent",
    author = "AskAgent Contributors",
    version = VERSION,
    about = "AskAgent - ask questions, get web-augmented answers",
    long_about = None
)]
struct Cli {
    /// Log at info level instead of warnings only
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Ask questions interactively, one at a time
    Chat,

    /// Show the effective configuration
    Check,
}

/// Shows the loop's status line on stderr and clears it when done.
struct TerminalStatus {
    term: Term,
}

#[async_trait]
impl LoopCallback for TerminalStatus {
    async fn on_status(&self, status: &str) {
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&style(status).dim().to_string());
    }

    async fn on_loop_complete(&self, _trace: &LoopTrace) {
        let _ = self.term.clear_line();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config()?;
    if !cli.verbose && std::env::var("RUST_LOG").is_err() {
        config.log.level = "warn".to_string();
    }
    init_logging(&config.log)?;
    log_startup("cli");

    match cli.command {
        Some(Commands::Ask { question }) => ask(&config, &question.join(" ")).await,
        Some(Commands::Chat) | None => chat(&config).await,
        Some(Commands::Check) => {
            check(&config);
            Ok(())
        }
    }
}

async fn ask(config: &Config, question: &str) -> anyhow::Result<()> {
    config.validate()?;
    let agent = AgentLoop::from_config(config)?;

    let question = match validate_question(question) {
        Ok(q) => q,
        Err(e) => {
            warn!("Ask called without a question");
            eprintln!("{}", style(e).yellow());
            return Ok(());
        }
    };

    answer(&agent, config, question).await
}

async fn chat(config: &Config) -> anyhow::Result<()> {
    config.validate()?;
    let agent = AgentLoop::from_config(config)?;

    println!("{}", style("AskAgent").bold());
    println!("{}", style("Type a question and press Enter. Ctrl-D to quit.").dim());

    let stdin = io::stdin();
    loop {
        print!("{} ", style(">").cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match validate_question(&line) {
            Ok(question) => answer(&agent, config, question).await?,
            Err(e) => {
                warn!("Question submitted without text");
                eprintln!("{}", style(e).yellow());
            }
        }
    }

    Ok(())
}

async fn answer(agent: &AgentLoop, config: &Config, question: &str) -> anyhow::Result<()> {
    let status = TerminalStatus {
        term: Term::stderr(),
    };
    let output = agent.run_with_callback(question, &status).await;

    let mut stdout = io::stdout();
    type_out(&output.response, config.ui.stream_delay, &mut stdout).await?;
    Ok(())
}

fn check(config: &Config) {
    let yes_no = |ok: bool| {
        if ok {
            style("yes").green()
        } else {
            style("no").red()
        }
    };

    println!("{}", style("AskAgent configuration").bold());
    println!("  config file:    {}", config_path().display());
    println!("  model:          {}", config.llm.model);
    println!("  temperature:    {}", config.llm.temperature);
    println!("  base url:       {}", config.llm.base_url);
    println!("  config valid:   {}", yes_no(config.validate().is_ok()));
    println!("  web search:     {}", yes_no(config.search.is_enabled()));
    println!(
        "  log file:       {}",
        config
            .log
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(stdout only)".to_string())
    );
}
