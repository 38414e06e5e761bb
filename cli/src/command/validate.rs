use clap::Args;
use epub_conform::catalog::Severity;
use epub_conform::error::EngineResult;
use epub_conform::options::Options;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// An EPUB file or directory containing the contents of an unzipped EPUB
    pub epub_path: PathBuf,

    /// Promote USAGE/INFO findings into strict conformance accounting
    #[arg(long)]
    strict: bool,

    /// Treat `epub_path` as a single content document instead of a full archive
    #[arg(long)]
    single_file: bool,

    /// Only print findings at or above this severity (fatal, error, warning, usage, info)
    #[arg(long, value_enum, default_value = "info")]
    min_severity: MinSeverity,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum MinSeverity {
    Fatal,
    Error,
    Warning,
    Usage,
    Info,
}

impl MinSeverity {
    fn allows(self, severity: Severity) -> bool {
        let threshold = match self {
            MinSeverity::Fatal => Severity::Fatal,
            MinSeverity::Error => Severity::Error,
            MinSeverity::Warning => Severity::Warning,
            MinSeverity::Usage => Severity::Usage,
            MinSeverity::Info => Severity::Info,
        };
        severity <= threshold
    }
}

impl ValidateCommand {
    pub fn run(&self) -> EngineResult<ExitCode> {
        let options = Options::builder()
            .strict(self.strict)
            .single_file_mode(self.single_file)
            .build();

        let report = epub_conform::validate_path(&self.epub_path, options)?;

        for finding in &report.findings {
            if self.min_severity.allows(finding.severity) {
                println!(
                    "{severity} {id} {location} {message}",
                    severity = finding.severity,
                    id = finding.id,
                    location = finding.location,
                    message = finding.message,
                );
            }
        }

        println!(
            "\n{} findings: {} fatal, {} error, {} warning, {} usage, {} info",
            report.findings.len(),
            report.counts.fatal,
            report.counts.error,
            report.counts.warning,
            report.counts.usage,
            report.counts.info,
        );

        if report.is_conforming() {
            println!("PASS: conforming");
            Ok(ExitCode::SUCCESS)
        } else {
            println!("FAIL: not conforming");
            Ok(ExitCode::FAILURE)
        }
    }
}
