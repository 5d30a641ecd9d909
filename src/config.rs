//! Environment-driven configuration.
//!
//! Backend credentials come from the environment (optionally via a `.env`
//! file). Placeholder values copied straight out of a setup guide are
//! treated as absent so a half-configured install degrades to the local
//! backend instead of hammering a nonexistent endpoint.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Document-database backend credentials.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    pub storage_bucket: Option<String>,
}

/// Relational REST backend credentials.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

/// Which store implementation a [`Config`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Firestore,
    Postgrest,
    LocalOnly,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub firestore: Option<FirestoreConfig>,
    pub supabase: Option<SupabaseConfig>,
    /// Directory for the persisted local datasets.
    pub data_dir: PathBuf,
}

/// Setup-guide placeholders like `your_project_url` that were never
/// replaced with real credentials.
fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value.contains("your_")
}

fn env_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !is_placeholder(&value) => Some(value),
        Ok(_) => {
            warn!(name, "Ignoring placeholder environment value");
            None
        }
        Err(_) => None,
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` first when
    /// present.
    pub fn from_env() -> Result<Self> {
        // Missing .env is the normal case, not an error.
        let _ = dotenvy::dotenv();

        let firestore = match (env_var("FIREBASE_PROJECT_ID"), env_var("FIREBASE_API_KEY")) {
            (Some(project_id), Some(api_key)) => Some(FirestoreConfig {
                project_id,
                api_key,
                storage_bucket: env_var("FIREBASE_STORAGE_BUCKET"),
            }),
            _ => None,
        };

        let supabase = match (env_var("SUPABASE_URL"), env_var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => {
                if reqwest::Url::parse(&url).is_ok() {
                    Some(SupabaseConfig { url, anon_key })
                } else {
                    warn!(%url, "Ignoring malformed SUPABASE_URL");
                    None
                }
            }
            _ => None,
        };

        let data_dir = match env::var("BAKESHOP_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .context("could not determine a data directory")?
                .join("bakeshop"),
        };

        let config = Self {
            firestore,
            supabase,
            data_dir,
        };
        debug!(backend = ?config.backend_kind(), "Configuration loaded");
        Ok(config)
    }

    /// Backend selection order: the document database wins when both are
    /// configured, then the relational backend, then local-only.
    pub fn backend_kind(&self) -> BackendKind {
        if self.firestore.is_some() {
            BackendKind::Firestore
        } else if self.supabase.is_some() {
            BackendKind::Postgrest
        } else {
            BackendKind::LocalOnly
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config {
            firestore: None,
            supabase: None,
            data_dir: PathBuf::from("/tmp/bakeshop-test"),
        }
    }

    #[test]
    fn backend_priority_prefers_firestore() {
        let mut config = local_config();
        assert_eq!(config.backend_kind(), BackendKind::LocalOnly);

        config.supabase = Some(SupabaseConfig {
            url: "https://demo.supabase.co".to_string(),
            anon_key: "key".to_string(),
        });
        assert_eq!(config.backend_kind(), BackendKind::Postgrest);

        config.firestore = Some(FirestoreConfig {
            project_id: "demo".to_string(),
            api_key: "key".to_string(),
            storage_bucket: None,
        });
        assert_eq!(config.backend_kind(), BackendKind::Firestore);
    }

    #[test]
    fn placeholder_values_are_rejected() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("your_project_url"));
        assert!(is_placeholder("https://your_project.supabase.co"));
        assert!(!is_placeholder("https://abcdefgh.supabase.co"));
        assert!(!is_placeholder("AIzaSyD-real-looking-key"));
    }
}
