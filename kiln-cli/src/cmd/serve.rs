use anyhow::Result;
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use kiln_core::build_site;
use kiln_core::error::report;
use kiln_dev_server::{DevServer, ServerConfig};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{path::PathBuf, time::Duration};
use tracing::{debug, error, info, warn};

use crate::config::KilnConfig;

pub fn make_subcommand() -> Command {
    Command::new("serve")
        .about("Build the site, rebuild it on changes and serve it over HTTP")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to serve on [default: 8080]")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = KilnConfig::load(args)?;
    let options = config.build_options();

    build_site(&options, Utc::now())?;

    let server = DevServer::new(ServerConfig {
        host: config.host.clone(),
        port: config.port,
        root: options.output_dir(),
        open: config.open,
    });

    tokio::select! {
        res = server.run() => res,
        res = watch_sources(&config) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}

/// Rebuild the site whenever a source file changes.
///
/// Rebuilds run one at a time. Changes that arrive during a rebuild are
/// folded into the next one.
async fn watch_sources(config: &KilnConfig) -> Result<()> {
    let options = config.build_options();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Vec<PathBuf>>(16);

    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                let paths = events.into_iter().map(|event| event.path).collect();
                let _ = tx.blocking_send(paths);
            }
            Err(err) => warn!("file watcher error: {err}"),
        },
    )?;

    for dir in [
        options.content_dir(),
        options.public_dir(),
        options.templates_dir(),
    ] {
        if dir.exists() {
            debouncer.watcher().watch(&dir, RecursiveMode::Recursive)?;
            debug!(dir = %dir.display(), "watching directory");
        }
    }

    let config_file = options.config_path();
    if config_file.exists() {
        debouncer
            .watcher()
            .watch(&config_file, RecursiveMode::NonRecursive)?;
        debug!(file = %config_file.display(), "watching config file");
    }

    info!("watching source files for changes");

    while let Some(mut changed) = rx.recv().await {
        while let Ok(more) = rx.try_recv() {
            changed.extend(more);
        }
        for path in &changed {
            debug!(path = %path.display(), "source file changed");
        }

        let build_options = options.clone();
        match tokio::task::spawn_blocking(move || build_site(&build_options, Utc::now())).await? {
            Ok(summary) => info!(
                "rebuilt {} pages in {} ms",
                summary.pages,
                summary.elapsed.as_millis()
            ),
            Err(err) => error!("rebuild failed: {}", report(&err)),
        }
    }

    Ok(())
}
