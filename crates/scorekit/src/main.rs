use crate::prelude::*;
use clap::Parser;

mod error;
mod extract;
mod prelude;
mod report;
mod serve;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract Woodcock-Johnson IV score reports and generate triennial assessment documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "SCOREKIT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract administrative fields and subtest scores from a score-report PDF
    Extract(crate::extract::Options),

    /// Generate the narrative document and the band-grid report
    Report(crate::report::Options),

    /// Serve the clinician upload form
    Serve(crate::serve::Options),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Extract(options) => crate::extract::run(options, app.global),
        SubCommands::Report(options) => crate::report::run(options, app.global),
        SubCommands::Serve(options) => crate::serve::run(options, app.global).await,
    }
}
