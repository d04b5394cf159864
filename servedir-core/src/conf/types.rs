use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::conf::error::ConfigError;
use crate::matcher::SourcePattern;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Optional number of worker threads - default is decided by Pingora.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            threads: None,
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

/// Either a plain switch or a list of glob patterns selecting the paths a
/// feature applies to.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Applicability {
    Toggle(bool),
    Patterns(Vec<SourcePattern>),
}

impl Applicability {
    pub fn applies_to(&self, path: &str) -> bool {
        match self {
            Applicability::Toggle(enabled) => *enabled,
            Applicability::Patterns(patterns) => {
                patterns.iter().any(|p| p.matches(path, false).is_some())
            }
        }
    }
}

impl Default for Applicability {
    fn default() -> Self {
        Applicability::Toggle(true)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteRule {
    pub source: SourcePattern,
    pub destination: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectRule {
    pub source: SourcePattern,
    pub destination: String,
    #[serde(default = "default_redirect_status", alias = "type")]
    pub status: u16,
}

fn default_redirect_status() -> u16 {
    301
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderRule {
    pub source: SourcePattern,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Served root. Canonicalized by [`ServeConfig::validate`].
    #[serde(default = "default_public")]
    pub public: PathBuf,

    #[serde(default)]
    pub clean_urls: Applicability,

    #[serde(default)]
    pub rewrites: Vec<RewriteRule>,

    #[serde(default)]
    pub redirects: Vec<RedirectRule>,

    #[serde(default)]
    pub headers: Vec<HeaderRule>,

    #[serde(default)]
    pub directory_listing: Applicability,

    /// `Some(true)`: paths must end in `/`. `Some(false)`: they must not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_slash: Option<bool>,

    /// Globs matched against `/{name}` of each child in a listing.
    #[serde(default)]
    pub unlisted: Vec<SourcePattern>,

    #[serde(default)]
    pub render_single: bool,

    #[serde(default)]
    pub etag: bool,

    #[serde(default)]
    pub symlinks: bool,

    #[serde(default = "enabled")]
    pub upload: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            public: default_public(),
            clean_urls: Applicability::default(),
            rewrites: Vec::new(),
            redirects: Vec::new(),
            headers: Vec::new(),
            directory_listing: Applicability::default(),
            trailing_slash: None,
            unlisted: Vec::new(),
            render_single: false,
            etag: false,
            symlinks: false,
            upload: true,
        }
    }
}

fn default_public() -> PathBuf {
    PathBuf::from(".")
}

fn enabled() -> bool {
    true
}

impl ServeConfig {
    /// Canonicalizes `public` and checks redirect statuses.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let public = self
            .public
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| ConfigError::MissingPublic {
                path: self.public.clone(),
            })?;
        self.public = public;

        for rule in &self.redirects {
            if !(300..400).contains(&rule.status) {
                return Err(ConfigError::InvalidRedirectStatus {
                    source_pattern: rule.source.to_string(),
                    status: rule.status,
                });
            }
        }

        Ok(())
    }

    /// Suffix appended to folder names in listings.
    pub fn folder_suffix(&self) -> &'static str {
        if self.trailing_slash == Some(false) {
            ""
        } else {
            "/"
        }
    }
}
