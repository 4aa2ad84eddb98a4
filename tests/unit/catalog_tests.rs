//! Unit tests for model catalog normalization.

use droid_acp::catalog::{normalize_catalog, ModelCatalog, RawModel, FALLBACK_MODEL_ID};

fn raw(id: &str, model_id: &str, display: &str) -> RawModel {
    RawModel {
        id: id.to_owned(),
        model_id: model_id.to_owned(),
        display_name: display.to_owned(),
        ..RawModel::default()
    }
}

fn assert_current_is_listed(catalog: &ModelCatalog) {
    assert!(
        !catalog.available_models.is_empty(),
        "catalog must never be empty"
    );
    assert!(
        catalog.contains(&catalog.current_model_id),
        "current id {} must be listed",
        catalog.current_model_id
    );
}

// ── Field resolution ─────────────────────────────────────────────────────────

/// `modelId` is preferred over `id`, and `displayName` over the id.
#[test]
fn primary_fields_are_preferred() {
    let catalog = normalize_catalog("m-1", &[raw("legacy", "m-1", "Model One")]);

    assert_eq!(catalog.available_models.len(), 1);
    let model = &catalog.available_models[0];
    assert_eq!(model.model_id, "m-1");
    assert_eq!(model.name, "Model One");
}

/// Entries without `modelId` fall back to `id`; without any name they use
/// the id as the name.
#[test]
fn secondary_fields_are_used_as_fallbacks() {
    let catalog = normalize_catalog("", &[raw("only-id", "", "")]);

    let model = &catalog.available_models[0];
    assert_eq!(model.model_id, "only-id");
    assert_eq!(model.name, "only-id");
}

/// `shortDisplayName` is the second choice for the name.
#[test]
fn short_display_name_is_second_choice() {
    let entry = RawModel {
        model_id: "m".into(),
        short_display_name: "Short".into(),
        ..RawModel::default()
    };

    let catalog = normalize_catalog("m", &[entry]);

    assert_eq!(catalog.available_models[0].name, "Short");
}

/// Entries with no resolvable id are dropped.
#[test]
fn entries_without_id_are_dropped() {
    let catalog = normalize_catalog("a", &[raw("", "", "Nameless"), raw("a", "", "A")]);

    assert_eq!(catalog.available_models.len(), 1);
    assert_eq!(catalog.available_models[0].model_id, "a");
}

/// A description equal to the name is omitted.
#[test]
fn description_identical_to_name_is_omitted() {
    let entry = RawModel {
        model_id: "m".into(),
        display_name: "Same".into(),
        description: "Same".into(),
        ..RawModel::default()
    };

    let catalog = normalize_catalog("m", &[entry]);

    assert_eq!(catalog.available_models[0].description, None);
}

/// Upstream order is preserved and duplicates are not collapsed.
#[test]
fn upstream_order_is_preserved() {
    let catalog = normalize_catalog("b", &[raw("b", "", ""), raw("a", "", ""), raw("b", "", "")]);

    let ids: Vec<&str> = catalog
        .available_models
        .iter()
        .map(|m| m.model_id.as_str())
        .collect();
    assert_eq!(ids, ["b", "a", "b"]);
}

// ── Current-id invariant ─────────────────────────────────────────────────────

/// An empty list synthesizes an entry for the current id.
#[test]
fn empty_list_synthesizes_current_model() {
    let catalog = normalize_catalog("claude-x", &[]);

    assert_eq!(catalog.current_model_id, "claude-x");
    assert_eq!(catalog.available_models.len(), 1);
    assert_current_is_listed(&catalog);
}

/// An empty list and an empty current id fall back to the fixed default.
#[test]
fn empty_everything_uses_fallback_model() {
    let catalog = normalize_catalog("  ", &[]);

    assert_eq!(catalog.current_model_id, FALLBACK_MODEL_ID);
    assert_current_is_listed(&catalog);
}

/// An empty current id defaults to the first listed model.
#[test]
fn empty_current_defaults_to_first_entry() {
    let catalog = normalize_catalog("", &[raw("first", "", ""), raw("second", "", "")]);

    assert_eq!(catalog.current_model_id, "first");
    assert_eq!(catalog.available_models.len(), 2);
}

/// A current id missing from the list is prepended.
#[test]
fn missing_current_is_prepended() {
    let catalog = normalize_catalog("ghost", &[raw("a", "", ""), raw("b", "", "")]);

    assert_eq!(catalog.available_models.len(), 3);
    assert_eq!(catalog.available_models[0].model_id, "ghost");
    assert_current_is_listed(&catalog);
}

/// The invariant holds across a spread of shapes.
#[test]
fn current_id_is_always_listed() {
    let lists: Vec<Vec<RawModel>> = vec![
        vec![],
        vec![raw("", "", "")],
        vec![raw("x", "", "")],
        vec![raw("", "y", "Y"), raw("z", "", "")],
    ];
    for current in ["", "x", "y", "unknown"] {
        for list in &lists {
            assert_current_is_listed(&normalize_catalog(current, list));
        }
    }
}

/// The catalog serializes with the camelCase field names the editor reads.
#[test]
fn catalog_serializes_camel_case() {
    let catalog = normalize_catalog("m", &[raw("", "m", "Model")]);

    let json = serde_json::to_value(&catalog).expect("serialize");

    assert_eq!(json["currentModelId"], "m");
    assert_eq!(json["availableModels"][0]["modelId"], "m");
    assert_eq!(json["availableModels"][0]["name"], "Model");
    assert!(json["availableModels"][0].get("description").is_none());
}
