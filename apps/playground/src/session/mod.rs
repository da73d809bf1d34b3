//! Persisted session state: the variable store and the last-used settings.
//!
//! Stored blobs carry no schema version. Anything that fails to parse is
//! logged and treated as absent, so a corrupt file only costs the user their
//! saved values, never startup.

pub mod handlers;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::GenerationConfig;
use crate::postprocess::PipelineConfig;
use crate::template::VariableStore;
use store::{BlobStore, StoreError};

pub const VARIABLES_BLOB: &str = "variables";
pub const SETTINGS_BLOB: &str = "settings";

/// Last-chosen generation parameters and pipeline toggles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub generation: GenerationConfig,
    pub pipeline: PipelineConfig,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Parses a blob, treating unparseable content as absent.
fn decode_or_absent<T>(
    name: &str,
    blob: Option<String>,
    decode: impl FnOnce(&str) -> Result<T, serde_json::Error>,
) -> Option<T> {
    let blob = blob?;
    match decode(&blob) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable '{name}' blob: {e}");
            None
        }
    }
}

/// Saved variables, or the sample set when nothing usable is stored.
pub fn load_variables(store: &dyn BlobStore) -> Result<VariableStore, StoreError> {
    let blob = store.get(VARIABLES_BLOB)?;
    Ok(decode_or_absent(VARIABLES_BLOB, blob, VariableStore::from_blob)
        .unwrap_or_else(VariableStore::with_defaults))
}

pub fn save_variables(store: &dyn BlobStore, variables: &VariableStore) -> Result<(), StoreError> {
    store.set(VARIABLES_BLOB, &variables.to_blob()?)
}

pub fn load_settings(store: &dyn BlobStore) -> Result<SessionSettings, StoreError> {
    let blob = store.get(SETTINGS_BLOB)?;
    Ok(decode_or_absent(SETTINGS_BLOB, blob, |b| serde_json::from_str(b)).unwrap_or_default())
}

/// Normalizes and stamps the settings before writing them.
pub fn save_settings(
    store: &dyn BlobStore,
    settings: SessionSettings,
) -> Result<SessionSettings, StoreError> {
    let settings = SessionSettings {
        generation: settings.generation.normalized(),
        pipeline: settings.pipeline,
        saved_at: Some(Utc::now()),
    };
    store.set(SETTINGS_BLOB, &serde_json::to_string(&settings)?)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Provider;
    use store::MemoryBlobStore;

    #[test]
    fn test_missing_variables_fall_back_to_samples() {
        let store = MemoryBlobStore::default();
        let variables = load_variables(&store).unwrap();
        assert_eq!(variables, VariableStore::with_defaults());
    }

    #[test]
    fn test_corrupt_variables_are_treated_as_absent() {
        let store = MemoryBlobStore::default();
        store.set(VARIABLES_BLOB, "{\"variables\": 12").unwrap();
        assert_eq!(load_variables(&store).unwrap(), VariableStore::with_defaults());
    }

    #[test]
    fn test_variables_round_trip_keeps_counter() {
        let store = MemoryBlobStore::default();
        let mut variables = VariableStore::new();
        variables.add("a", "1").unwrap();
        let removed = variables.add("b", "2").unwrap();
        variables.remove(removed);
        save_variables(&store, &variables).unwrap();

        let mut restored = load_variables(&store).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.add("c", "3").unwrap(), 2);
    }

    #[test]
    fn test_corrupt_settings_are_treated_as_absent() {
        let store = MemoryBlobStore::default();
        store.set(SETTINGS_BLOB, "not json at all").unwrap();
        assert_eq!(load_settings(&store).unwrap(), SessionSettings::default());
    }

    #[test]
    fn test_settings_are_normalized_and_stamped_on_save() {
        let store = MemoryBlobStore::default();
        let settings = SessionSettings {
            generation: GenerationConfig {
                provider: Provider::OpenAi,
                model: "gpt-4o".to_string(),
                temperature: 3.0,
                max_output_tokens: 512,
                json_mode: true,
            },
            pipeline: PipelineConfig::all(),
            saved_at: None,
        };
        let saved = save_settings(&store, settings).unwrap();
        assert_eq!(saved.generation.temperature, 2.0);
        assert!(saved.saved_at.is_some());
        assert_eq!(load_settings(&store).unwrap(), saved);
    }

    #[test]
    fn test_partial_settings_blob_fills_defaults() {
        let store = MemoryBlobStore::default();
        store
            .set(SETTINGS_BLOB, r#"{"pipeline": {"remove_emojis": true}}"#)
            .unwrap();
        let settings = load_settings(&store).unwrap();
        assert!(settings.pipeline.remove_emojis);
        assert_eq!(settings.generation, GenerationConfig::default());
    }
}
