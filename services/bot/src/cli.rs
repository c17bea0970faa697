use crate::server;
use clap::{Args, Parser, Subcommand};
use job_board::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "job-board-bot",
    about = "Run the job board chat bot and manage its database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and the chat transport (default command)
    Serve(ServeArgs),
    /// Create the database schema and exit
    InitDb,
    /// Delete the database file and recreate an empty schema
    ResetDb,
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
        Command::InitDb => server::init_db(),
        Command::ResetDb => server::reset_db(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["job-board-bot"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn database_commands_use_kebab_case() {
        let cli = Cli::try_parse_from(["job-board-bot", "reset-db"]).expect("parses");
        assert!(matches!(cli.command, Some(Command::ResetDb)));

        let cli = Cli::try_parse_from(["job-board-bot", "serve", "--port", "8080"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }
}
