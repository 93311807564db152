use clap::{Parser, Subcommand};
use colored::Colorize;

use palisade::agent::{Agent, AgentConfig};
use palisade::config::Config;
use palisade::llm::mistral::MistralClient;
use palisade::llm::LlmProvider;
use palisade::security::{classify, gate, InteractivePrompt};
use palisade::tools::registry_with_command_timeout;

#[derive(Parser)]
#[command(name = "palisade")]
#[command(about = "An AI assistant where every model-proposed action passes a risk gate.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat {
        /// Mistral model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Skip confirmation for low-risk actions (risky ones still ask)
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List available tools
    Tools,
    /// Show configuration
    Config,
    /// Classify a shell command without running it
    Check {
        /// The command to classify
        command: String,
    },
}

fn create_provider(cfg: &Config, model: &str) -> Result<Box<dyn LlmProvider>, String> {
    let api_key = cfg.resolved_api_key().ok_or_else(|| {
        "No API key configured. Set MISTRAL_API_KEY or add api_key to ~/.palisade/config.toml."
            .to_string()
    })?;
    let client = MistralClient::new(&cfg.llm.base_url, model, api_key)
        .map_err(|e| e.to_string())?;
    Ok(Box::new(client))
}

fn run_chat(model: Option<String>, yes: bool) {
    let cfg = Config::load();

    let model = model.unwrap_or(cfg.llm.model.clone());

    println!("{}", format!("palisade v{}", env!("CARGO_PKG_VERSION")).bold());
    println!("Every action passes the gate.\n");
    println!("Model: {}", model.green());
    println!("Type {} to exit.\n", "Ctrl+D".dimmed());

    let provider = match create_provider(&cfg, &model) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    };

    let registry = registry_with_command_timeout(cfg.agent.command_timeout_secs);
    let agent_config = AgentConfig {
        max_iterations: cfg.agent.max_iterations,
        auto_confirm: yes || cfg.agent.auto_confirm,
    };

    let mut agent = Agent::new(provider, registry, agent_config);
    let mut prompt = InteractivePrompt;

    let mut rl = match rustyline::DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{} Failed to initialize readline: {}", "Error:".red(), e);
            std::process::exit(1);
        }
    };

    loop {
        let readline = rl.readline(&format!("{} ", "you>".blue().bold()));
        match readline {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                let start = std::time::Instant::now();
                eprint!("{}", "[thinking...]".dimmed());
                let response = agent.process_message(input, &mut prompt);
                eprint!("\r{}\r", " ".repeat(20));
                println!("{} {}", "bot>".green().bold(), response);
                let elapsed = start.elapsed();
                println!("{}", format!("({:.1}s)", elapsed.as_secs_f64()).dimmed());
                println!();
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("Use Ctrl+D to exit.");
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }
}

fn run_check(command: &str) {
    let verdict = classify(command);
    println!("{}", gate::format_risk_warning(&verdict));
    if verdict.is_blocked() {
        std::process::exit(1);
    }
}

fn main() {
    palisade::logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { model, yes } => {
            run_chat(model, yes);
        }
        Commands::Tools => {
            let registry = palisade::tools::default_registry();
            println!("{}", "Available tools:".bold());
            println!();
            for tool in registry.list() {
                println!("  {} - {}", tool.name().cyan(), tool.description());
            }
        }
        Commands::Config => {
            let mut config = Config::load();
            if config.llm.api_key.is_some() {
                config.llm.api_key = Some("[REDACTED]".to_string());
            }
            println!("{}", "Current configuration:".bold());
            println!();
            match toml::to_string_pretty(&config) {
                Ok(s) => println!("{}", s),
                Err(e) => eprintln!("Error serializing config: {}", e),
            }
        }
        Commands::Check { command } => {
            run_check(&command);
        }
    }
}
