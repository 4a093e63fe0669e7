use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::document::{IdentifierMap, str_at, value_at_mut};

pub const VISUALIZATION_WIDGET_PREFIX: &str = "visualization_";

const WIDGET_SOURCE_ID: &[&str] = &["source", "id"];
const WIDGET_PARAMETER_ID: &[&str] = &["parameters", "visualizationParameters", "id"];
const DATA_SOURCE_ID: &[&str] = &["dataSource", "id"];

/// A cross-reference with no entry in the identifier map at rewrite time.
/// The stale id stays in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub location: String,
    pub id: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no destination id for {} referenced at {}",
            self.id, self.location
        )
    }
}

/// Visualization ids referenced by `visualization_*` widgets of a dashboard.
pub fn extract_visualization_ids(dashboard: &Value) -> BTreeSet<String> {
    let Some(Value::Object(widgets)) = dashboard.get("widgets") else {
        return BTreeSet::new();
    };

    widgets
        .iter()
        .filter(|(key, _)| key.starts_with(VISUALIZATION_WIDGET_PREFIX))
        .filter_map(|(_, widget)| str_at(widget, WIDGET_SOURCE_ID))
        .map(str::to_string)
        .collect()
}

pub fn extract_semantic_model_id(visualization: &Value) -> Option<String> {
    str_at(visualization, DATA_SOURCE_ID).map(str::to_string)
}

/// Points every visualization widget at its destination visualization.
///
/// Both `source.id` and the older `parameters.visualizationParameters.id`
/// layout are rewritten. Ids missing from `ids` are left in place and
/// reported.
pub fn rewrite_visualization_references(
    dashboard: &mut Value,
    ids: &IdentifierMap,
) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();
    let Some(Value::Object(widgets)) = dashboard.get_mut("widgets") else {
        return dangling;
    };

    for (key, widget) in widgets.iter_mut() {
        if !key.starts_with(VISUALIZATION_WIDGET_PREFIX) {
            continue;
        }
        for path in [WIDGET_SOURCE_ID, WIDGET_PARAMETER_ID] {
            let location = format!("widgets.{key}.{}", path.join("."));
            if let Some(reference) = rewrite_at(widget, path, ids, location) {
                dangling.push(reference);
            }
        }
    }

    dangling
}

pub fn rewrite_semantic_model_reference(
    visualization: &mut Value,
    ids: &IdentifierMap,
) -> Option<DanglingReference> {
    rewrite_at(
        visualization,
        DATA_SOURCE_ID,
        ids,
        DATA_SOURCE_ID.join("."),
    )
}

fn rewrite_at(
    value: &mut Value,
    path: &[&str],
    ids: &IdentifierMap,
    location: String,
) -> Option<DanglingReference> {
    let slot = value_at_mut(value, path)?;
    let current = slot.as_str()?.to_string();

    match ids.get(&current) {
        Some(mapped) => {
            *slot = Value::String(mapped.to_string());
            None
        }
        None => Some(DanglingReference {
            location,
            id: current,
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extraction_reads_only_visualization_widgets() {
        let dashboard = json!({
            "widgets": {
                "visualization_1": {"source": {"id": "V1"}},
                "visualization_2": {"source": {"label": "no id"}},
                "text_1": {"source": {"id": "T1"}},
                "filter_1": {"source": {"id": "F1"}}
            }
        });
        let ids = extract_visualization_ids(&dashboard);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["V1".to_string()]);
    }

    #[test]
    fn extraction_deduplicates_shared_visualizations() {
        let dashboard = json!({
            "widgets": {
                "visualization_2": {"source": {"id": "V1"}},
                "visualization_1": {"source": {"id": "V1"}},
                "visualization_3": {"source": {"id": "V0"}}
            }
        });
        let ids = extract_visualization_ids(&dashboard);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("V0"));
        assert!(ids.contains("V1"));
    }

    #[test]
    fn extraction_without_widgets_is_empty() {
        assert!(extract_visualization_ids(&json!({"label": "Empty"})).is_empty());
        assert!(extract_visualization_ids(&json!({"widgets": []})).is_empty());
    }

    #[test]
    fn semantic_model_id_is_optional() {
        assert_eq!(
            extract_semantic_model_id(&json!({"dataSource": {"id": "M1"}})),
            Some("M1".to_string())
        );
        assert_eq!(extract_semantic_model_id(&json!({"dataSource": {}})), None);
        assert_eq!(extract_semantic_model_id(&json!({"label": "static"})), None);
    }

    #[test]
    fn rewrite_maps_both_widget_reference_layouts() {
        let mut dashboard = json!({
            "widgets": {
                "visualization_1": {"source": {"id": "V1"}},
                "visualization_2": {"parameters": {"visualizationParameters": {"id": "V2"}}},
                "text_1": {"source": {"id": "V1"}}
            }
        });
        let mut ids = IdentifierMap::new();
        ids.insert("V1", "N1");
        ids.insert("V2", "N2");

        let dangling = rewrite_visualization_references(&mut dashboard, &ids);

        assert!(dangling.is_empty());
        assert_eq!(dashboard["widgets"]["visualization_1"]["source"]["id"], "N1");
        assert_eq!(
            dashboard["widgets"]["visualization_2"]["parameters"]["visualizationParameters"]["id"],
            "N2"
        );
        assert_eq!(dashboard["widgets"]["text_1"]["source"]["id"], "V1");
    }

    #[test]
    fn rewrite_reports_unmapped_widget_references() {
        let mut dashboard = json!({
            "widgets": {"visualization_7": {"source": {"id": "V7"}}}
        });

        let dangling = rewrite_visualization_references(&mut dashboard, &IdentifierMap::new());

        assert_eq!(
            dangling,
            vec![DanglingReference {
                location: "widgets.visualization_7.source.id".to_string(),
                id: "V7".to_string(),
            }]
        );
        assert_eq!(dashboard["widgets"]["visualization_7"]["source"]["id"], "V7");
    }

    #[test]
    fn semantic_model_reference_is_rewritten_or_reported() {
        let mut ids = IdentifierMap::new();
        ids.insert("M1", "M9");

        let mut mapped = json!({"dataSource": {"id": "M1", "type": "SemanticModel"}});
        assert!(rewrite_semantic_model_reference(&mut mapped, &ids).is_none());
        assert_eq!(mapped["dataSource"]["id"], "M9");

        let mut unmapped = json!({"dataSource": {"id": "M2"}});
        let warning = rewrite_semantic_model_reference(&mut unmapped, &ids).expect("dangling");
        assert_eq!(warning.location, "dataSource.id");
        assert_eq!(
            warning.to_string(),
            "no destination id for M2 referenced at dataSource.id"
        );

        let mut without_source = json!({"label": "static"});
        assert!(rewrite_semantic_model_reference(&mut without_source, &ids).is_none());
    }
}
