#![allow(dead_code)]

//! Ordered, id-addressed collection of `${key}` bindings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariableError {
    /// The id counter would pass `u64::MAX`, so ids could no longer stay unique.
    #[error("variable id {0} is out of range")]
    IdOutOfRange(u64),
}

/// A single named variable. `id` is stable across key edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: u64,
    pub key: String,
    pub value: String,
}

/// Ordered variable collection. Insertion order is substitution order.
///
/// Ids are handed out from a monotonic counter and are never reused, even
/// after the variable holding them is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableStore {
    next_id: u64,
    variables: Vec<Variable>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the sample bindings shown to a first-time user.
    pub fn with_defaults() -> Self {
        let variables: Vec<Variable> = [("childName", "민수"), ("subject", "수학"), ("score", "85")]
            .into_iter()
            .zip(0u64..)
            .map(|((key, value), id)| Variable {
                id,
                key: key.to_string(),
                value: value.to_string(),
            })
            .collect();
        Self {
            next_id: variables.len() as u64,
            variables,
        }
    }

    /// Builds a store from explicit variables, keeping their ids.
    pub fn from_variables(variables: Vec<Variable>) -> Result<Self, VariableError> {
        let mut store = Self {
            next_id: 0,
            variables,
        };
        store.normalize_counter()?;
        Ok(store)
    }

    pub fn add(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<u64, VariableError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(VariableError::IdOutOfRange(id))?;
        self.variables.push(Variable {
            id,
            key: key.into(),
            value: value.into(),
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.variables.len();
        self.variables.retain(|v| v.id != id);
        self.variables.len() != before
    }

    pub fn set_key(&mut self, id: u64, key: impl Into<String>) -> bool {
        match self.variables.iter_mut().find(|v| v.id == id) {
            Some(variable) => {
                variable.key = key.into();
                true
            }
            None => false,
        }
    }

    pub fn set_value(&mut self, id: u64, value: impl Into<String>) -> bool {
        match self.variables.iter_mut().find(|v| v.id == id) {
            Some(variable) => {
                variable.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: u64) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Serializes the store, counter included, for the blob store.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restores a store from a blob. Callers treat `Err` as "no stored variables".
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        let mut store: VariableStore = serde_json::from_str(blob)?;
        store
            .normalize_counter()
            .map_err(<serde_json::Error as serde::de::Error>::custom)?;
        Ok(store)
    }

    /// A hand-edited or truncated blob may carry a stale counter; never let
    /// it fall at or below an id already in use.
    fn normalize_counter(&mut self) -> Result<(), VariableError> {
        if let Some(max_id) = self.variables.iter().map(|v| v.id).max() {
            let floor = max_id
                .checked_add(1)
                .ok_or(VariableError::IdOutOfRange(max_id))?;
            self.next_id = self.next_id.max(floor);
        }
        Ok(())
    }
}
