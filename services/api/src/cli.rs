use crate::server;
use clap::{Args, Parser, Subcommand};
use waste_tips::error::AppError;
use waste_tips::sorting::Localizer;

#[derive(Parser, Debug)]
#[command(
    name = "waste-tips-api",
    about = "Serve localized waste-sorting guidance for photos of household waste",
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
    /// List the supported response languages
    Languages,
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
        Command::Languages => {
            print!("{}", language_listing(&Localizer::shared()));
            Ok(())
        }
    }
}

fn language_listing(localizer: &Localizer) -> String {
    localizer
        .languages()
        .map(|entry| format!("{:<4}{}\n", entry.code, entry.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["waste-tips-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["waste-tips-api", "serve", "--port", "9090"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(9090)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn listing_has_one_line_per_language() {
        let listing = language_listing(&Localizer::new());
        assert_eq!(listing.lines().count(), 25);
        assert!(listing.lines().any(|line| line == "de  German"));
        assert!(listing.lines().any(|line| line == "uk  Ukrainian"));
    }
}
