use crate::batch::{run_allocate, AllocateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use club_allocator::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "club-allocator",
    about = "Allocate pupils to after-school clubs from their ranked preferences",
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
    /// Run a full allocation from a submissions CSV and write the exports
    Allocate(AllocateArgs),
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
        Command::Allocate(args) => run_allocate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_command_parses_flags() {
        let cli = Cli::try_parse_from([
            "club-allocator",
            "allocate",
            "--input",
            "requests.csv",
            "--rounds",
            "2",
            "--save-capacities",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Allocate(args)) => {
                assert_eq!(args.input.to_str(), Some("requests.csv"));
                assert_eq!(args.rounds, Some(2));
                assert!(args.save_capacities);
                assert!(args.history.is_none());
            }
            other => panic!("expected allocate command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["club-allocator"]).expect("parses");
        assert!(cli.command.is_none());
    }
}
