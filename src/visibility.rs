//! Build mode detection and draft visibility.
//!
//! Debug detection runs in a fixed order: an explicit debug flag, then the
//! inverse of the production flag, then a `debug=true` query parameter, and
//! finally defaults to enabled.

use crate::model::{Entry, Schema};

pub const ENV_MODE: &str = "COURSE_INDEX_ENV";
pub const ENV_DEBUG: &str = "COURSE_INDEX_DEBUG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMode {
    /// `None` when the production flag is unknown.
    pub production: Option<bool>,
    pub debug: Option<bool>,
    /// Raw query string of the current request, without the leading `?`.
    pub query: Option<String>,
}

impl BuildMode {
    pub fn production() -> Self {
        Self {
            production: Some(true),
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            production: Some(false),
            ..Default::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Read the mode from the process environment.
    pub fn from_env() -> Self {
        let production = std::env::var(ENV_MODE)
            .ok()
            .map(|v| v.trim().eq_ignore_ascii_case("production"));
        let debug = std::env::var(ENV_DEBUG).ok().and_then(|v| parse_flag(&v));
        Self {
            production,
            debug,
            query: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.production.unwrap_or(false)
    }

    pub fn debug_enabled(&self) -> bool {
        if let Some(debug) = self.debug {
            return debug;
        }
        if let Some(production) = self.production {
            return !production;
        }
        if let Some(debug) = self.query.as_deref().and_then(query_debug) {
            return debug;
        }
        true
    }

    /// Whether a record with the given draft flag is visible in this mode.
    pub fn shows(&self, draft: Option<bool>) -> bool {
        match draft {
            None | Some(false) => true,
            Some(true) => !self.is_production() || self.debug_enabled(),
        }
    }

    pub fn include<D: Schema>(&self, entry: &Entry<D>) -> bool {
        self.shows(entry.data.draft())
    }
}

/// Where the build mode comes from. Read on every call so a long-running
/// process picks up changes.
#[derive(Debug, Clone, Default)]
pub enum ModeSource {
    #[default]
    Env,
    Fixed(BuildMode),
}

impl ModeSource {
    pub fn current(&self) -> BuildMode {
        match self {
            ModeSource::Env => BuildMode::from_env(),
            ModeSource::Fixed(mode) => mode.clone(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Value of the `debug` parameter in a query string.
pub fn query_debug(query: &str) -> Option<bool> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == "debug")
        .map(|(_, value)| value == "true")
}
