use anyhow::Result;
use chrono::Utc;
use clap::{ArgMatches, Command};
use kiln_core::build_site;
use tracing::info;

use crate::config::KilnConfig;

pub fn make_subcommand() -> Command {
    Command::new("build").about("Delete the output directory if there is one and build the site")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = KilnConfig::load(args)?;
    let options = config.build_options().clean(true);

    let report = build_site(&options, Utc::now())?;

    info!(
        output = %options.output_dir().display(),
        "built {} pages in {} ms",
        report.pages,
        report.elapsed.as_millis()
    );

    Ok(())
}
