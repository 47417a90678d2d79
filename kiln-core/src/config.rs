use std::{fmt, path::Path};

use serde::Serialize;

use crate::schema::{self, Field, FieldError};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parsing(toml::de::Error),
    Field(FieldError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parsing(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::Field(e) => write!(f, "invalid value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parsing(e) => Some(e),
            ConfigError::Field(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Parsing(value)
    }
}

impl From<FieldError> for ConfigError {
    fn from(value: FieldError) -> Self {
        ConfigError::Field(value)
    }
}

/// Site-wide settings read from the project's config file.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteConfig {
    pub title: String,
    /// Base URL of the site, always ending in `/` once loaded.
    pub url: String,
}

const SITE_SCHEMA: &[Field<SiteConfig>] = &[
    Field::new("title", |c, v| {
        c.title = schema::string("title", v)?;
        Ok(())
    }),
    Field::new("url", |c, v| {
        c.url = schema::string("url", v)?;
        Ok(())
    }),
];

impl SiteConfig {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let doc: toml::Table = toml::from_str(data)?;

        let mut config = SiteConfig::default();
        schema::overlay(&mut config, &doc, SITE_SCHEMA)?;
        config.normalize();

        Ok(config)
    }

    fn normalize(&mut self) {
        if !self.url.ends_with('/') {
            self.url.push('/');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_gets_trailing_slash() {
        let config = SiteConfig::parse("title = \"Blog\"\nurl = \"https://example.com\"").unwrap();
        assert_eq!(config.title, "Blog");
        assert_eq!(config.url, "https://example.com/");
    }

    #[test]
    fn url_with_slash_is_unchanged() {
        let config = SiteConfig::parse("url = \"https://example.com/blog/\"").unwrap();
        assert_eq!(config.url, "https://example.com/blog/");
        assert_eq!(config.title, "");
    }

    #[test]
    fn missing_url_becomes_root() {
        let config = SiteConfig::parse("title = \"Blog\"").unwrap();
        assert_eq!(config.url, "/");
    }

    #[test]
    fn invalid_documents_are_errors() {
        assert!(matches!(
            SiteConfig::parse("title = "),
            Err(ConfigError::Parsing(_))
        ));
        assert!(matches!(
            SiteConfig::parse("title = [1, 2]"),
            Err(ConfigError::Field(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SiteConfig::read("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
