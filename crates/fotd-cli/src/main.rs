mod lookup;
mod sensor;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fotd_core::ProviderId;
use fotd_providers::DEFAULT_UPCOMING_DAYS;

#[derive(Debug, Parser)]
#[command(name = "fotd")]
#[command(about = "Flavor of the day for frozen custard stands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List supported providers and what they can do
    Providers,
    /// Find stores for a provider
    Search {
        provider: ProviderId,
        /// City, zip or address; may be empty for fixed-catalog providers
        #[arg(default_value = "")]
        term: String,
        #[arg(long)]
        state: Option<String>,
        /// Provider option as KEY=VALUE (repeatable)
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
    /// Show one store's details
    Location {
        provider: ProviderId,
        location_id: String,
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
    /// Show today's flavor
    Flavor {
        provider: ProviderId,
        location_id: String,
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
    /// Show scheduled flavors from today on
    Upcoming {
        provider: ProviderId,
        location_id: String,
        #[arg(long, default_value_t = DEFAULT_UPCOMING_DAYS)]
        days: usize,
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
    /// Check that a store can be reached
    Check {
        provider: ProviderId,
        location_id: String,
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
    /// Poll every configured store and print sensor updates as JSON lines
    Watch {
        /// Stores file; defaults to FOTD_STORES_PATH
        #[arg(long)]
        stores: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = fotd_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Providers => {
            lookup::list_providers();
            Ok(())
        }
        Commands::Search {
            provider,
            term,
            state,
            options,
        } => lookup::search(&config, provider, &term, state.as_deref(), &options).await,
        Commands::Location {
            provider,
            location_id,
            options,
        } => lookup::location(&config, provider, &location_id, &options).await,
        Commands::Flavor {
            provider,
            location_id,
            options,
        } => lookup::flavor(&config, provider, &location_id, &options).await,
        Commands::Upcoming {
            provider,
            location_id,
            days,
            options,
        } => lookup::upcoming(&config, provider, &location_id, days, &options).await,
        Commands::Check {
            provider,
            location_id,
            options,
        } => lookup::check(&config, provider, &location_id, &options).await,
        Commands::Watch { stores } => watch::run(&config, stores).await,
    }
}

#[cfg(test)]
mod tests;
