//! `sqlrows`: reports `database/sql` rows that are never closed and
//! deferred closes that run before the error check.

mod check;
mod manifest;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::output::{resolve_color_choice, ColorArg, StyledOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "sqlrows")]
#[command(about = "Checks that sql.Rows values are closed and closed in the right place", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Package import paths to analyze (default: every non-stub package)
    pub packages: Vec<String>,

    /// Source tree root; packages live under <ROOT>/src
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Pretty)]
    pub format: Format,

    /// Config file (default: sqlrows.toml found walking up from the root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Require Close to be called through defer
    #[arg(long)]
    pub require_defer: bool,

    /// Also require rows.Err to be called
    #[arg(long)]
    pub check_err: bool,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    pub color: ColorArg,

    /// Print the SSA form of the selected packages instead of analyzing
    #[arg(long)]
    pub dump_ir: bool,
}

fn init_logging() {
    if let Ok(filter) = EnvFilter::try_from_env("SQLROWS_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let color = resolve_color_choice(cli.color);

    match check::execute(&cli) {
        Ok(status) => status.exit_code(),
        Err(err) => {
            let mut out = StyledOutput::new(color);
            out.stderr_error(&format!("{:#}", err));
            check::Status::Failed.exit_code()
        }
    }
}
