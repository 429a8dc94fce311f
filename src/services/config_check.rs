//! Boot-time check of the live `.env` file. Keys that were added to the
//! template after a school installed the proxy are copied over automatically.

use std::collections::HashSet;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, AppResult, ErrorCode};

const BASE_KEYS: [&str; 4] = [
    "TENANT_NAME",
    "DEBUG_MODE",
    "ZERMELO_PORTAL_URL",
    "ZERMELO_API_TOKEN",
];
const CONNECT_CODE_KEYS: [&str; 2] = ["CONNECT_CODE", "AUTH_TOKEN_SECRET"];

const MIGRATION_MARKER: &str = "# Auto-migrated";

static DEFINED_KEY: OnceLock<Regex> = OnceLock::new();

fn defined_key_regex() -> &'static Regex {
    DEFINED_KEY.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=")
            .expect("static regex is valid")
    })
}

/// What a successful check changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Keys appended to the live file from the template.
    pub migrated: Vec<String>,
    /// Keys missing from both the live file and the template.
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigCheck {
    live: PathBuf,
    template: PathBuf,
}

impl ConfigCheck {
    pub fn new(live: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            live: live.into(),
            template: template.into(),
        }
    }

    /// Paths from `CONFIG_FILE` and `CONFIG_TEMPLATE`.
    pub fn from_env() -> Self {
        Self::new(
            env::var("CONFIG_FILE").unwrap_or_else(|_| ".env".to_string()),
            env::var("CONFIG_TEMPLATE").unwrap_or_else(|_| ".env.example".to_string()),
        )
    }

    pub fn live_path(&self) -> &Path {
        &self.live
    }

    /// Check against the process environment and load the (possibly
    /// migrated) live file into it.
    pub fn run(&self) -> AppResult<MigrationReport> {
        let report = self.verify_with(|key| env::var_os(key).is_some())?;

        if self.live.exists() {
            dotenvy::from_path(&self.live).map_err(|e| {
                tracing::error!("Failed to load {}: {}", self.live.display(), e);
                AppError::new(ErrorCode::ConfigMissing)
                    .with_details(format!("{} kon niet worden gelezen: {}", self.live.display(), e))
            })?;
        }

        Ok(report)
    }

    /// Check the live file; `in_env` reports whether the process environment
    /// already provides a key.
    pub fn verify_with<F>(&self, in_env: F) -> AppResult<MigrationReport>
    where
        F: Fn(&str) -> bool,
    {
        let live = match fs::read_to_string(&self.live) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", self.live.display(), e);
                None
            }
        };

        let defined = live.as_deref().map(defined_keys).unwrap_or_default();
        let exists = |key: &str| defined.contains(key) || in_env(key);

        let missing = required_keys(&exists);
        if missing.is_empty() {
            return Ok(MigrationReport::default());
        }

        let Some(live) = live else {
            tracing::error!(
                "{} not found and the environment lacks: {}",
                self.live.display(),
                missing.join(", ")
            );
            return Err(AppError::new(ErrorCode::ConfigMissing).with_details(format!(
                "Kopieer {} naar {} en vul de ontbrekende instellingen in: {}",
                self.template.display(),
                self.live.display(),
                missing.join(", ")
            )));
        };

        let template = fs::read_to_string(&self.template).unwrap_or_else(|e| {
            tracing::warn!("Cannot read template {}: {}", self.template.display(), e);
            String::new()
        });

        let mut report = MigrationReport::default();
        let mut appended = String::new();
        if !live.is_empty() && !live.ends_with('\n') {
            appended.push('\n');
        }

        for key in &missing {
            match template_value(&template, key)? {
                Some(value) => {
                    appended.push_str(&format!("{}\n{}={}\n", MIGRATION_MARKER, key, value));
                    report.migrated.push(key.to_string());
                }
                None => report.unresolved.push(key.to_string()),
            }
        }

        if !report.unresolved.is_empty() {
            tracing::warn!(
                "Config keys missing from {} and {}: {}",
                self.live.display(),
                self.template.display(),
                report.unresolved.join(", ")
            );
        }

        if report.migrated.is_empty() {
            return Ok(report);
        }

        self.append(&appended).map_err(|e| {
            tracing::error!("Cannot write {}: {}", self.live.display(), e);
            AppError::new(ErrorCode::ConfigNotWritable).with_details(format!(
                "Missing configuration keys: {}. Please add these keys to {}.",
                missing.join(", "),
                self.live.display()
            ))
        })?;

        tracing::info!(
            "Config file automatically migrated. Added keys: {}",
            report.migrated.join(", ")
        );

        Ok(report)
    }

    fn append(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.live)?;
        file.write_all(content.as_bytes())?;
        file.flush()
    }
}

/// Keys the service cannot start without. The connect-code pair is only
/// needed when no static `API_TOKEN` is configured.
pub fn required_keys<F>(exists: F) -> Vec<&'static str>
where
    F: Fn(&str) -> bool,
{
    let mut keys: Vec<&'static str> = BASE_KEYS.to_vec();
    if !exists("API_TOKEN") {
        keys.extend(CONNECT_CODE_KEYS);
    }
    keys.into_iter().filter(|key| !exists(key)).collect()
}

fn defined_keys(content: &str) -> HashSet<String> {
    defined_key_regex()
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn template_value(template: &str, key: &str) -> AppResult<Option<String>> {
    let pattern = format!(r"(?m)^\s*(?:export\s+)?{}\s*=(.*)$", regex::escape(key));
    let re = Regex::new(&pattern).map_err(|e| {
        tracing::error!("Invalid template pattern for {}: {}", key, e);
        AppError::new(ErrorCode::Default)
    })?;

    Ok(re
        .captures(template)
        .map(|caps| caps[1].trim().to_string()))
}
