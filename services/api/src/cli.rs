use crate::report::{run_score, run_styles, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use style_finder::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "StyleFinder",
    about = "Run the StyleFinder quiz service or score submissions from the command line",
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
    /// Validate and score a submission JSON file without starting the server
    Score(ScoreArgs),
    /// List the style categories with their polarity and results page slug
    Styles,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Styles => {
            run_styles();
            Ok(())
        }
    }
}
