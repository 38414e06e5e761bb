use clap::Parser;
use epub_conform::error::EngineResult;
use epub_conform_cli::Cli;
use epub_conform_cli::command::Commands;
use std::process::ExitCode;

fn main() -> EngineResult<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.commands {
        Commands::Validate(validate) => validate.run(),
    }
}
