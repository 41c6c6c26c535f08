//! User preferences
//!
//! Preferences outlive a session's step memory. They are a flat key-value
//! document per profile and are rendered into every prompt.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{error::MemoryError, Result};

/// Key of the agent's display name
pub const AGENT_NAME_KEY: &str = "agent_name";

/// Key-value preference document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    entries: BTreeMap<String, String>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.get(AGENT_NAME_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prompt block listing every preference, empty when there are none
    pub fn to_prompt(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut block = String::from("User Preferences:\n");
        for (key, value) in &self.entries {
            block.push_str(&format!("- {}: {}\n", key.replace('_', " "), value));
        }
        block
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Preferences {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Trait for preference storage backends
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Load a profile's preferences
    ///
    /// # Returns
    /// NotFound if the profile was never saved
    async fn load(&self, profile: &str) -> Result<Preferences>;

    /// Replace a profile's preferences
    async fn save(&self, profile: &str, preferences: &Preferences) -> Result<()>;

    fn name(&self) -> &str;
}

/// In-memory preference store
#[derive(Clone, Default)]
pub struct InMemoryPreferenceStore {
    profiles: Arc<DashMap<String, Preferences>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load(&self, profile: &str) -> Result<Preferences> {
        self.profiles
            .get(profile)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MemoryError::not_found(profile))
    }

    async fn save(&self, profile: &str, preferences: &Preferences) -> Result<()> {
        self.profiles
            .insert(profile.to_string(), preferences.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Preferences for all profiles in one pretty-printed JSON file
pub struct JsonPreferenceStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_document(&self) -> Result<BTreeMap<String, Preferences>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferenceStore {
    async fn load(&self, profile: &str) -> Result<Preferences> {
        self.read_document()
            .await?
            .remove(profile)
            .ok_or_else(|| MemoryError::not_found(profile))
    }

    async fn save(&self, profile: &str, preferences: &Preferences) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        document.insert(profile.to_string(), preferences.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(&document)?).await?;

        tracing::debug!("Saved preferences for profile: {}", profile);
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}
