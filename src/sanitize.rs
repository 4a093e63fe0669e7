//! Strips server-assigned fields from fetched documents so they can be posted
//! to a create endpoint on another org.
//!
//! Dashboards and visualizations are cleaned with a deny-list of field paths.
//! Semantic models are rebuilt from an allow-list instead.

use serde_json::{Map, Value};

use crate::config::DEFAULT_DATA_SPACE;
use crate::document::{Document, ResourceKind};

/// Collections copied verbatim when a semantic model is rebuilt.
pub const SEMANTIC_MODEL_COLLECTIONS: [&str; 8] = [
    "semanticCalculatedDimensions",
    "semanticCalculatedMeasurements",
    "semanticDataObjects",
    "semanticGroupings",
    "semanticLogicalViews",
    "semanticMetrics",
    "semanticParameters",
    "semanticRelationships",
];

#[derive(Debug, Clone, Copy)]
enum Segment {
    Key(&'static str),
    Each,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Remove(&'static [&'static str]),
    RemoveNested(&'static [&'static str]),
    Rename {
        from: &'static str,
        to: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct Condition {
    key: &'static str,
    equals: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    scope: &'static [Segment],
    when: Option<Condition>,
    action: Action,
}

const PAGES: &[Segment] = &[
    Segment::Key("layouts"),
    Segment::Each,
    Segment::Key("pages"),
    Segment::Each,
];
const PAGE_WIDGETS: &[Segment] = &[
    Segment::Key("layouts"),
    Segment::Each,
    Segment::Key("pages"),
    Segment::Each,
    Segment::Key("widgets"),
    Segment::Each,
];
const WIDGETS: &[Segment] = &[Segment::Key("widgets"), Segment::Each];

const DASHBOARD_RULES: &[Rule] = &[
    Rule {
        scope: &[],
        when: None,
        action: Action::Remove(&[
            "permissions",
            "createdBy",
            "createdDate",
            "customViews",
            "url",
            "id",
        ]),
    },
    Rule {
        scope: PAGES,
        when: None,
        action: Action::Remove(&["id"]),
    },
    Rule {
        scope: PAGES,
        when: None,
        action: Action::Rename {
            from: "label",
            to: "name",
        },
    },
    Rule {
        scope: PAGE_WIDGETS,
        when: None,
        action: Action::Remove(&["id"]),
    },
    Rule {
        scope: WIDGETS,
        when: None,
        action: Action::Remove(&["id"]),
    },
    Rule {
        scope: WIDGETS,
        when: Some(Condition {
            key: "type",
            equals: "visualization",
        }),
        action: Action::RemoveNested(&["source", "label"]),
    },
];

const VISUALIZATION_RULES: &[Rule] = &[
    Rule {
        scope: &[],
        when: None,
        action: Action::Remove(&[
            "id",
            "createdBy",
            "createdDate",
            "lastModifiedBy",
            "lastModifiedDate",
            "permissions",
            "url",
        ]),
    },
    Rule {
        scope: &[Segment::Key("view")],
        when: None,
        action: Action::Remove(&["id", "isOriginal", "url"]),
    },
    Rule {
        scope: &[Segment::Key("fields"), Segment::Each],
        when: None,
        action: Action::Remove(&["id", "url"]),
    },
    Rule {
        scope: &[Segment::Key("workspace")],
        when: None,
        action: Action::Remove(&["id", "url"]),
    },
    Rule {
        scope: &[Segment::Key("dataSource")],
        when: None,
        action: Action::Remove(&["url"]),
    },
];

/// Caller-supplied replacements applied while rebuilding a semantic model.
#[derive(Debug, Clone, Default)]
pub struct SemanticModelOverrides {
    pub api_name: Option<String>,
    pub label: Option<String>,
    pub dataspace: Option<String>,
}

/// Returns a copy of `body` that is safe to submit as a creation request for
/// `kind`. Missing fields are skipped; non-object bodies come back unchanged.
pub fn sanitize(body: &Value, kind: ResourceKind) -> Value {
    match kind {
        ResourceKind::Dashboard => apply_rules(body, DASHBOARD_RULES),
        ResourceKind::Visualization => apply_rules(body, VISUALIZATION_RULES),
        ResourceKind::SemanticModel => {
            reconstruct_semantic_model(body, &SemanticModelOverrides::default())
        }
    }
}

pub fn sanitize_document(document: &Document) -> Document {
    let body = sanitize(document.body(), document.kind());
    Document::new(document.kind(), body).unwrap_or_else(|_| document.clone())
}

/// Builds a fresh semantic model payload from the allow-listed fields of
/// `source`. Collections absent from the source become empty lists.
pub fn reconstruct_semantic_model(source: &Value, overrides: &SemanticModelOverrides) -> Value {
    let Value::Object(fields) = source else {
        return source.clone();
    };

    let mut model = Map::new();
    insert_text(&mut model, "apiName", overrides.api_name.as_deref(), fields);
    insert_text(&mut model, "label", overrides.label.as_deref(), fields);

    let dataspace = overrides
        .dataspace
        .clone()
        .map(Value::String)
        .or_else(|| fields.get("dataspace").cloned())
        .unwrap_or_else(|| Value::String(DEFAULT_DATA_SPACE.to_string()));
    model.insert("dataspace".to_string(), dataspace);

    for collection in SEMANTIC_MODEL_COLLECTIONS {
        let items = fields
            .get(collection)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        model.insert(collection.to_string(), items);
    }

    Value::Object(model)
}

fn insert_text(
    model: &mut Map<String, Value>,
    key: &str,
    replacement: Option<&str>,
    source: &Map<String, Value>,
) {
    let value = match replacement {
        Some(text) => Some(Value::String(text.to_string())),
        None => source.get(key).cloned(),
    };
    if let Some(value) = value {
        model.insert(key.to_string(), value);
    }
}

fn apply_rules(body: &Value, rules: &[Rule]) -> Value {
    let mut sanitized = body.clone();
    for rule in rules {
        apply_in_scope(&mut sanitized, rule.scope, rule);
    }
    sanitized
}

fn apply_in_scope(value: &mut Value, scope: &[Segment], rule: &Rule) {
    match scope.split_first() {
        None => apply_action(value, rule),
        Some((Segment::Key(key), rest)) => {
            if let Some(child) = value.get_mut(*key) {
                apply_in_scope(child, rest, rule);
            }
        }
        Some((Segment::Each, rest)) => match value {
            Value::Array(items) => {
                for item in items {
                    apply_in_scope(item, rest, rule);
                }
            }
            Value::Object(entries) => {
                for item in entries.values_mut() {
                    apply_in_scope(item, rest, rule);
                }
            }
            _ => {}
        },
    }
}

fn apply_action(target: &mut Value, rule: &Rule) {
    let Value::Object(map) = target else {
        return;
    };

    if let Some(condition) = rule.when {
        let matches = map
            .get(condition.key)
            .and_then(Value::as_str)
            .is_some_and(|value| value == condition.equals);
        if !matches {
            return;
        }
    }

    match rule.action {
        Action::Remove(keys) => {
            for key in keys {
                map.remove(*key);
            }
        }
        Action::RemoveNested(path) => {
            let Some((last, parents)) = path.split_last() else {
                return;
            };
            let mut cursor = Some(&mut *map);
            for key in parents {
                cursor = cursor
                    .and_then(|current| current.get_mut(*key))
                    .and_then(Value::as_object_mut);
            }
            if let Some(parent) = cursor {
                parent.remove(*last);
            }
        }
        Action::Rename { from, to } => {
            if let Some(value) = map.remove(from) {
                map.insert(to.to_string(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn dashboard_fixture() -> Value {
        json!({
            "id": "0FKHo0000000001",
            "label": "Overview",
            "name": "Overview",
            "description": "A dashboard",
            "workspaceIdOrApiName": "TabEmbed",
            "permissions": {"modify": true},
            "createdBy": {"id": "005Ho"},
            "createdDate": "2025-06-01T10:00:00.000Z",
            "customViews": [],
            "url": "/services/data/v64.0/tableau/dashboards/0FKHo0000000001",
            "layouts": [{
                "id": "0WnHo0000000006KAA",
                "name": "default",
                "columnCount": 36,
                "pages": [{
                    "id": "0khHo0000000049IAA",
                    "label": "Page 1",
                    "name": "7c9d0472-81ea-400b-8812-1504a401f813",
                    "widgets": [
                        {"id": "0WmHo000000CaRCKA0", "name": "visualization_1", "row": 2},
                        {"id": "0WmHo000000CaREKA0", "name": "text_1", "row": 0}
                    ]
                }]
            }],
            "widgets": {
                "visualization_1": {
                    "id": "0WmHo000000CaRCKA0",
                    "type": "visualization",
                    "source": {"id": "1AKHo000000GmaEOAS", "label": "Revenue", "name": "Revenue"}
                },
                "text_1": {
                    "id": "0WmHo000000CaREKA0",
                    "type": "text",
                    "source": {"label": "kept for text widgets"},
                    "parameters": {"content": "Hello"}
                }
            }
        })
    }

    fn visualization_fixture() -> Value {
        json!({
            "id": "1AKHo000000GmaEOAS",
            "label": "Revenue",
            "name": "Revenue",
            "createdBy": {"id": "005Ho"},
            "createdDate": "2025-06-01T10:00:00.000Z",
            "lastModifiedBy": {"id": "005Ho"},
            "lastModifiedDate": "2025-06-02T10:00:00.000Z",
            "permissions": {"modify": true},
            "url": "/services/data/v64.0/tableau/visualizations/1AKHo000000GmaEOAS",
            "dataSource": {
                "id": "0FKHo000000SDM1",
                "label": "Retail NTO",
                "name": "Retail_NTO",
                "type": "SemanticModel",
                "url": "/services/data/v64.0/ssot/semantic/models/Retail_NTO"
            },
            "fields": {
                "F1": {"id": "0FfHo1", "url": "/fields/F1", "role": "Dimension"},
                "F2": {"role": "Measure"}
            },
            "view": {"id": "0VwHo1", "isOriginal": true, "url": "/view", "label": "default"},
            "workspace": {"id": "0WsHo1", "url": "/ws", "name": "TabEmbed"},
            "visualSpecification": {"marks": {"panes": {}}},
            "interactions": []
        })
    }

    #[test]
    fn dashboard_sanitizer_removes_only_deny_listed_paths() {
        let sanitized = sanitize(&dashboard_fixture(), ResourceKind::Dashboard);

        let expected = json!({
            "label": "Overview",
            "name": "Overview",
            "description": "A dashboard",
            "workspaceIdOrApiName": "TabEmbed",
            "layouts": [{
                "id": "0WnHo0000000006KAA",
                "name": "default",
                "columnCount": 36,
                "pages": [{
                    "name": "Page 1",
                    "widgets": [
                        {"name": "visualization_1", "row": 2},
                        {"name": "text_1", "row": 0}
                    ]
                }]
            }],
            "widgets": {
                "visualization_1": {
                    "type": "visualization",
                    "source": {"id": "1AKHo000000GmaEOAS", "name": "Revenue"}
                },
                "text_1": {
                    "type": "text",
                    "source": {"label": "kept for text widgets"},
                    "parameters": {"content": "Hello"}
                }
            }
        });
        assert_eq!(sanitized, expected);
    }

    #[test]
    fn visualization_sanitizer_removes_only_deny_listed_paths() {
        let sanitized = sanitize(&visualization_fixture(), ResourceKind::Visualization);

        let expected = json!({
            "label": "Revenue",
            "name": "Revenue",
            "dataSource": {
                "id": "0FKHo000000SDM1",
                "label": "Retail NTO",
                "name": "Retail_NTO",
                "type": "SemanticModel"
            },
            "fields": {
                "F1": {"role": "Dimension"},
                "F2": {"role": "Measure"}
            },
            "view": {"label": "default"},
            "workspace": {"name": "TabEmbed"},
            "visualSpecification": {"marks": {"panes": {}}},
            "interactions": []
        });
        assert_eq!(sanitized, expected);
    }

    #[test]
    fn sanitizer_tolerates_missing_optional_sections() {
        let bare = json!({"label": "Only a label"});
        assert_eq!(sanitize(&bare, ResourceKind::Dashboard), bare);
        assert_eq!(sanitize(&bare, ResourceKind::Visualization), bare);

        let odd_shapes = json!({"widgets": "not a map", "layouts": [1, null, {"pages": 3}]});
        assert_eq!(sanitize(&odd_shapes, ResourceKind::Dashboard), odd_shapes);
    }

    #[test]
    fn sanitizer_leaves_non_object_bodies_alone() {
        let body = json!(["a", "b"]);
        assert_eq!(sanitize(&body, ResourceKind::Dashboard), body);
        assert_eq!(sanitize(&body, ResourceKind::SemanticModel), body);
    }

    #[test]
    fn sanitizing_fixtures_twice_is_a_no_op() {
        for (fixture, kind) in [
            (dashboard_fixture(), ResourceKind::Dashboard),
            (visualization_fixture(), ResourceKind::Visualization),
            (
                json!({"id": "0FK", "apiName": "Retail", "semanticMetrics": [{"id": "m"}]}),
                ResourceKind::SemanticModel,
            ),
        ] {
            let once = sanitize(&fixture, kind);
            let twice = sanitize(&once, kind);
            assert_eq!(once, twice, "{kind} sanitizer is not idempotent");
        }
    }

    #[test]
    fn semantic_model_is_rebuilt_from_allow_list() {
        let source = json!({
            "id": "0FKHo000000SDM1",
            "apiName": "Retail_NTO",
            "label": "Retail NTO",
            "dataspace": "sales",
            "createdBy": {"id": "005Ho"},
            "lastModifiedDate": "2025-06-02T10:00:00.000Z",
            "semanticDataObjects": [{"id": "keep-verbatim", "apiName": "Orders"}],
            "semanticMetrics": [{"apiName": "Revenue"}]
        });
        let overrides = SemanticModelOverrides {
            api_name: Some("Retail_NTO_Clone_Ab12".to_string()),
            label: Some("Retail NTO Clone Ab12".to_string()),
            dataspace: Some("default".to_string()),
        };

        let model = reconstruct_semantic_model(&source, &overrides);

        assert_eq!(
            model,
            json!({
                "apiName": "Retail_NTO_Clone_Ab12",
                "label": "Retail NTO Clone Ab12",
                "dataspace": "default",
                "semanticCalculatedDimensions": [],
                "semanticCalculatedMeasurements": [],
                "semanticDataObjects": [{"id": "keep-verbatim", "apiName": "Orders"}],
                "semanticGroupings": [],
                "semanticLogicalViews": [],
                "semanticMetrics": [{"apiName": "Revenue"}],
                "semanticParameters": [],
                "semanticRelationships": []
            })
        );
    }

    #[test]
    fn semantic_model_without_overrides_keeps_source_names() {
        let model = sanitize(
            &json!({"id": "0FK", "apiName": "Retail", "label": "Retail"}),
            ResourceKind::SemanticModel,
        );
        assert_eq!(model["apiName"], "Retail");
        assert_eq!(model["label"], "Retail");
        assert_eq!(model["dataspace"], DEFAULT_DATA_SPACE);
        assert!(model.get("id").is_none());
    }

    #[test]
    fn sanitize_document_keeps_kind() {
        let doc = Document::new(ResourceKind::Visualization, visualization_fixture())
            .expect("object body");
        let sanitized = sanitize_document(&doc);
        assert_eq!(sanitized.kind(), ResourceKind::Visualization);
        assert!(sanitized.id().is_none());
    }

    fn arb_key() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(vec![
                "id",
                "url",
                "label",
                "name",
                "type",
                "visualization",
                "source",
                "widgets",
                "layouts",
                "pages",
                "view",
                "fields",
                "workspace",
                "dataSource",
                "permissions",
                "isOriginal",
                "apiName",
                "semanticMetrics",
            ])
            .prop_map(str::to_string),
            "[a-z]{1,6}",
        ]
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            prop_oneof![Just("visualization".to_string()), "[a-z]{0,6}"].prop_map(Value::String),
        ];
        leaf.prop_recursive(5, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(arb_key(), inner, 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    fn arb_kind() -> impl Strategy<Value = ResourceKind> {
        prop_oneof![
            Just(ResourceKind::Dashboard),
            Just(ResourceKind::Visualization),
            Just(ResourceKind::SemanticModel),
        ]
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(body in arb_json(), kind in arb_kind()) {
            let once = sanitize(&body, kind);
            let twice = sanitize(&once, kind);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn sanitized_roots_never_carry_server_fields(body in arb_json(), kind in arb_kind()) {
            let sanitized = sanitize(&body, kind);
            if let Value::Object(map) = &sanitized {
                for field in ["id", "createdBy", "createdDate", "permissions", "url"] {
                    prop_assert!(!map.contains_key(field), "{} survived on {}", field, kind);
                }
            }
        }
    }
}
