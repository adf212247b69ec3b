use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stockfolio::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// User whose portfolio to operate on
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Buy or sell one share (operator: increase/add/buy or decrease/subtract/sell)
    Trade {
        ticker: String,
        operator: String,
        /// Unit price; defaults to the current price
        #[arg(long)]
        price: Option<String>,
    },
    /// Buy one share
    Buy {
        ticker: String,
        /// Unit price; defaults to the current price
        #[arg(long)]
        price: Option<String>,
    },
    /// Sell one share
    Sell { ticker: String },
    /// Show the full stock record as JSON
    Quote { ticker: String },
    /// Display positions valued at current prices
    Portfolio,
    /// Adjust the cash balance (operator: add/subtract)
    Balance { amount: String, operator: String },
    /// Add a ticker to the watchlist
    Watch { ticker: String },
    /// Remove a ticker from the watchlist
    Unwatch { ticker: String },
    /// Display the watchlist
    Watchlist,
}

impl From<Commands> for stockfolio::AppCommand {
    fn from(cmd: Commands) -> stockfolio::AppCommand {
        use stockfolio::AppCommand;
        match cmd {
            Commands::Trade {
                ticker,
                operator,
                price,
            } => AppCommand::Trade {
                ticker,
                operator,
                price,
            },
            Commands::Buy { ticker, price } => AppCommand::Trade {
                ticker,
                operator: "buy".to_string(),
                price,
            },
            Commands::Sell { ticker } => AppCommand::Trade {
                ticker,
                operator: "sell".to_string(),
                price: None,
            },
            Commands::Quote { ticker } => AppCommand::Quote { ticker },
            Commands::Portfolio => AppCommand::Portfolio,
            Commands::Balance { amount, operator } => AppCommand::Balance { amount, operator },
            Commands::Watch { ticker } => AppCommand::Watch { ticker },
            Commands::Unwatch { ticker } => AppCommand::Unwatch { ticker },
            Commands::Watchlist => AppCommand::Watchlist,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stockfolio::cli::setup::setup(),
        Some(cmd) => {
            stockfolio::run_command(cmd.into(), cli.user.as_deref(), cli.config_path.as_deref())
                .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
