use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "entrygate", version, about = "Entrygate submission client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current eligibility
    Status(commands::status::StatusArgs),
    /// Submission history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Send a new entry
    Submit(commands::submit::SubmitArgs),
    /// Draft management
    Draft {
        #[command(subcommand)]
        action: commands::draft::DraftAction,
    },
    /// Rewarded-ad override
    Reward {
        #[command(subcommand)]
        action: commands::reward::RewardAction,
    },
    /// Cooldown countdown and reminders
    Cooldown {
        #[command(subcommand)]
        action: commands::cooldown::CooldownAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    // Logs go to stderr; stdout carries JSON only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_env("ENTRYGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status(args) => commands::status::run(args),
        Commands::History { action } => commands::history::run(action),
        Commands::Submit(args) => commands::submit::run(args),
        Commands::Draft { action } => commands::draft::run(action),
        Commands::Reward { action } => commands::reward::run(action),
        Commands::Cooldown { action } => commands::cooldown::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
