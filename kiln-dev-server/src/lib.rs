use anyhow::{Context, Result};
use axum::Router;
use std::{net::SocketAddr, path::PathBuf};
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Configuration for the development server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Directory to serve
    pub root: PathBuf,
    /// Auto-open browser
    pub open: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            root: PathBuf::from("build"),
            open: false,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid address {}:{}", self.host, self.port))
    }
}

/// A static file server for the built site
pub struct DevServer {
    config: ServerConfig,
}

impl DevServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// The router serving files from the root directory
    pub fn router(&self) -> Router {
        Router::new().fallback_service(ServeDir::new(&self.config.root))
    }

    /// Serve until the process is stopped
    pub async fn run(self) -> Result<()> {
        if !self.config.root.exists() {
            anyhow::bail!(
                "root directory does not exist: {}",
                self.config.root.display()
            );
        }

        let addr = self.config.addr()?;
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("error binding to {addr}"))?;

        info!("listening on http://{addr}");
        info!(root = %self.config.root.display(), "serving directory");

        if self.config.open {
            if let Err(e) = open::that(format!("http://{addr}")) {
                warn!("failed to open browser: {e}");
            }
        }

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn default_address() {
        let config = ServerConfig::default();
        assert_eq!(config.addr().unwrap(), "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn invalid_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(config.addr().is_err());
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let server = DevServer::new(ServerConfig {
            root: PathBuf::from("/definitely/not/here"),
            ..ServerConfig::default()
        });
        assert!(server.run().await.is_err());
    }

    #[tokio::test]
    async fn serves_files_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("about")).unwrap();
        std::fs::write(dir.path().join("about/index.html"), "<p>about</p>").unwrap();

        let server = DevServer::new(ServerConfig {
            root: dir.path().to_path_buf(),
            ..ServerConfig::default()
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, server.router()).await });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /about/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("<p>about</p>"));
    }
}
