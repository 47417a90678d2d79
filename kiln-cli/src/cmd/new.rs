use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use kiln_core::scaffold;
use std::path::Path;

use crate::config::KilnConfig;

pub fn make_subcommand() -> Command {
    Command::new("new")
        .about("Create a new site structure in the given directory")
        .arg(
            Arg::new("dir")
                .value_name("DIR")
                .help("Where to create the site [default: the project root]"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = KilnConfig::load(args)?;
    let dir = args
        .get_one::<String>("dir")
        .cloned()
        .unwrap_or(config.root);

    scaffold(Path::new(&dir)).context("error creating site structure")?;

    Ok(())
}
