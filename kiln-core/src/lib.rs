pub mod assets;
pub mod build;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod filename;
pub mod header;
pub mod markdown;
pub mod render;
pub mod scaffold;
pub mod scanner;
pub mod schema;
pub mod site;
pub mod sitemap;
pub mod template;

// Re-export main types
pub use build::{BuildContext, BuildOptions, BuildReport, build_site};
pub use config::SiteConfig;
pub use error::{BuildError, ManifestError, PageError};
pub use scaffold::scaffold;
pub use scanner::SiteScanner;
pub use site::{Page, Site};
pub use template::TemplateSet;
