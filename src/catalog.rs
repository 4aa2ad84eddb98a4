//! Model catalog normalization.
//!
//! Converts the worker's settings/model report into the editor's model
//! catalog shape. The result always lists at least one model and always
//! contains its current model id.

use serde::{Deserialize, Serialize};

/// Model id used when the worker reports neither models nor a current model.
pub const FALLBACK_MODEL_ID: &str = "droid-default";

/// One model entry as reported by the worker. Every field is optional on
/// the wire.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RawModel {
    /// Secondary id field.
    pub id: String,
    /// Primary id field.
    pub model_id: String,
    /// Provider name, informational only.
    pub model_provider: String,
    /// Primary display name.
    pub display_name: String,
    /// Secondary display name.
    pub short_display_name: String,
    /// Optional long description.
    pub description: String,
}

/// One model entry in the editor's catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Model identifier.
    pub model_id: String,
    /// Display name.
    pub name: String,
    /// Description, omitted when it would repeat the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelInfo {
    fn synthesized(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_owned(),
            name: model_id.to_owned(),
            description: None,
        }
    }
}

/// Normalized model catalog sent in the `session/new` reply.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelCatalog {
    /// Models in upstream order, possibly preceded by a synthesized current
    /// model.
    pub available_models: Vec<ModelInfo>,
    /// Currently selected model; always one of `available_models`.
    pub current_model_id: String,
}

impl ModelCatalog {
    /// Whether `model_id` is listed.
    #[must_use]
    pub fn contains(&self, model_id: &str) -> bool {
        self.available_models.iter().any(|m| m.model_id == model_id)
    }
}

/// Build a [`ModelCatalog`] from the worker's current model id and raw list.
#[must_use]
pub fn normalize_catalog(current_model_id: &str, raw: &[RawModel]) -> ModelCatalog {
    let mut current = current_model_id.trim().to_owned();
    let mut models: Vec<ModelInfo> = raw.iter().filter_map(resolve_model).collect();

    if models.is_empty() {
        let fallback = if current.is_empty() {
            FALLBACK_MODEL_ID.to_owned()
        } else {
            current.clone()
        };
        models.push(ModelInfo::synthesized(&fallback));
    }

    if current.is_empty() {
        current.clone_from(&models[0].model_id);
    }

    if !models.iter().any(|m| m.model_id == current) {
        models.insert(0, ModelInfo::synthesized(&current));
    }

    ModelCatalog {
        available_models: models,
        current_model_id: current,
    }
}

fn resolve_model(raw: &RawModel) -> Option<ModelInfo> {
    let model_id = first_non_empty(&[&raw.model_id, &raw.id])?;
    let name = first_non_empty(&[&raw.display_name, &raw.short_display_name])
        .unwrap_or_else(|| model_id.clone());
    let description = first_non_empty(&[&raw.description, &raw.display_name])
        .filter(|desc| *desc != name);

    Some(ModelInfo {
        model_id,
        name,
        description,
    })
}

fn first_non_empty(candidates: &[&String]) -> Option<String> {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}
