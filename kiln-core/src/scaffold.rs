//! Skeleton of a new site.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("{0} already exists")]
    Exists(PathBuf),

    #[error("error creating {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const SITE_DIRS: &[&str] = &["content", "templates", "public"];

const SITE_FILES: &[(&str, &str)] = &[
    (
        "config.toml",
        "url = \"http://localhost:8080\"\ntitle = \"My website\"\n",
    ),
    (
        "templates/default.html",
        "<!DOCTYPE html>\n<html>\n<head>\n\t<title>{{ title }}</title>\n</head>\n<body>\n{{ content | safe }}\n</body>\n</html>\n",
    ),
    (
        "content/index.md",
        "+++\ntitle = \"Welcome\"\n+++\n\nWelcome to my website.\n",
    ),
];

/// Create the directory layout and starter files of a new site below `root`.
///
/// Fails without touching anything if one of the site directories already exists.
pub fn scaffold(root: &Path) -> Result<(), ScaffoldError> {
    if let Some(existing) = SITE_DIRS.iter().map(|d| root.join(d)).find(|p| p.exists()) {
        return Err(ScaffoldError::Exists(existing));
    }

    fs::create_dir_all(root).map_err(io_err(root))?;
    for dir in SITE_DIRS {
        let path = root.join(dir);
        fs::create_dir(&path).map_err(io_err(&path))?;
    }

    for (name, contents) in SITE_FILES {
        let path = root.join(name);
        fs::write(&path, contents).map_err(io_err(&path))?;
    }

    info!(root = %root.display(), "created new site");
    Ok(())
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ScaffoldError + use<> {
    let path = path.to_path_buf();
    move |source| ScaffoldError::Io { path, source }
}
