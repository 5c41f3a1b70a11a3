use crate::demo::{run_quote, run_sync, QuoteArgs, SyncArgs};
use crate::server;
use choice_pricing::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Choice Pricing Engine",
    about = "Quote reservations and refresh supplier pricing from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a reservation request file and print the breakdown
    Quote(QuoteArgs),
    /// Push supplier cost and markup into the pricing matrix
    Sync(SyncArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Product catalog JSON file (defaults to the bundled demo catalog)
    #[arg(long)]
    pub(crate) catalog: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::Sync(args) => run_sync(args).await,
    }
}
