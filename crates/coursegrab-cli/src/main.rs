use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "coursegrab", version, about = "Course grabbing dashboard CLI")]
struct Cli {
    /// Override the configured API root for this invocation
    #[arg(long, global = true)]
    api_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and store a session credential
    Login {
        /// The upstream session cookie value (a pasted `JSESSIONID=...` is fine)
        credential: String,
    },
    /// Catalog browsing
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Selection list management
    Selection {
        #[command(subcommand)]
        action: commands::selection::SelectionAction,
    },
    /// Grab task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match coursegrab_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(api_root) = cli.api_root {
        config.api_root = api_root;
    }

    let result = match cli.command {
        Commands::Login { credential } => commands::login::run(&config, &credential).await,
        Commands::Catalog { action } => commands::catalog::run(&config, action).await,
        Commands::Selection { action } => commands::selection::run(&config, action).await,
        Commands::Task { action } => commands::task::run(&config, action).await,
        Commands::Config { action } => commands::config::run(&config, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
