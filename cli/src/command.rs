use clap::Subcommand;

mod validate;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate an EPUB archive against the EPUB 2.0.1/3.3 conformance checks.
    Validate(validate::ValidateCommand),
}
