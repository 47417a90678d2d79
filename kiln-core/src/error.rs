//! Error types for the build pipeline.
//!
//! Failures are split by blast radius: a [`BuildError`] stops the build, a
//! [`PageError`] only affects one page and a [`ManifestError`] only affects
//! one of the sitemap or feed.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::schema::FieldError;

/// Result type alias for build-level operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Render an error and its chain of sources on one line.
pub fn report(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !out.contains(&message) {
            out.push_str(": ");
            out.push_str(&message);
        }
        source = cause.source();
    }
    out
}

/// Fatal errors. The build stops as soon as one of these is returned.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("error reading templates from {path}: {message}")]
    Templates { path: PathBuf, message: String },

    #[error("error reading configuration file at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("error reading content directory {path}: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("error copying static files from {path}: {source}")]
    Assets {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error preparing output directory {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Recoverable errors scoped to a single page.
///
/// Every variant carries the source file so the log line can point at it.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("missing closing header block delimiter in {path}")]
    MalformedHeaderBlock { path: PathBuf },

    #[error("invalid header block in {path}: {message}")]
    HeaderBlock { path: PathBuf, message: String },

    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid template name {name:?} in {path}")]
    UnknownTemplate { path: PathBuf, name: String },

    #[error("error rendering template for {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("error writing {dest} for {path}: {source}")]
    Write {
        path: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn header_field(path: impl Into<PathBuf>, source: FieldError) -> Self {
        Self::HeaderBlock {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// The source file the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::MalformedHeaderBlock { path }
            | Self::HeaderBlock { path, .. }
            | Self::Encoding { path }
            | Self::Io { path, .. }
            | Self::UnknownTemplate { path, .. }
            | Self::Template { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}

/// Recoverable errors from sitemap or feed generation.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid feed: {0}")]
    Feed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_errors_name_the_source_file() {
        let err = PageError::MalformedHeaderBlock {
            path: PathBuf::from("content/blog/post.md"),
        };
        assert_eq!(err.path(), std::path::Path::new("content/blog/post.md"));
        assert!(err.to_string().contains("content/blog/post.md"));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PageError::io("content/about.md", io);
        assert!(err.to_string().contains("content/about.md"));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn unknown_template_mentions_name() {
        let err = PageError::UnknownTemplate {
            path: PathBuf::from("content/a.md"),
            name: "post.html".into(),
        };
        assert!(err.to_string().contains("\"post.html\""));
    }

    #[test]
    fn report_includes_sources() {
        let err = BuildError::Assets {
            path: PathBuf::from("public"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let text = report(&err);
        assert!(text.starts_with("error copying static files from public"));
        assert_eq!(text.matches("denied").count(), 1);
    }
}
