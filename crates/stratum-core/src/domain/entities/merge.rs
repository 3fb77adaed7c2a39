//! Metadata merging along an ancestor chain.
//!
//! Each key combines according to its schema rule. Null values count as
//! absent. `category` is taken from the leaf alone and `extends` is dropped,
//! so the result describes the leaf's own position. After merging, every
//! declared key is checked against its kind.

use std::collections::{BTreeMap, BTreeSet};

use super::chain::AncestorChain;
use super::document::{CATEGORY_KEY, EXTENDS_KEY, MetaValue, Metadata};
use crate::domain::error::DomainError;
use crate::domain::schema::{FieldSpec, Schema, find_field};
use crate::domain::value_objects::MergeRule;

/// One chain entry's view of a (possibly nested) map.
#[derive(Clone, Copy)]
struct Layer<'a> {
    map: &'a BTreeMap<String, MetaValue>,
    is_leaf: bool,
}

impl AncestorChain<'_> {
    /// Merge metadata root to leaf.
    pub fn merge_metadata(&self, schema: &Schema) -> Result<Metadata, DomainError> {
        let last = self.len().saturating_sub(1);
        let layers: Vec<Layer<'_>> = self
            .members()
            .iter()
            .enumerate()
            .map(|(i, doc)| Layer {
                map: &doc.metadata,
                is_leaf: i == last,
            })
            .collect();

        let source_path = self.leaf().map(|d| d.location()).unwrap_or_default();
        let merged = merge_layers(&layers, schema.fields(), "", &source_path)?;
        check_kinds(&merged, schema.fields(), "", &source_path)?;
        Ok(merged)
    }
}

fn merge_layers(
    layers: &[Layer<'_>],
    specs: &[FieldSpec],
    scope: &str,
    source_path: &str,
) -> Result<Metadata, DomainError> {
    let keys: BTreeSet<&String> = layers.iter().flat_map(|l| l.map.keys()).collect();
    let mut merged = Metadata::new();

    for key in keys {
        let spec = find_field(specs, key);
        let field = format!("{scope}{key}");

        // `extends` is consumed by resolution and never inherited.
        if scope.is_empty() && key == EXTENDS_KEY {
            continue;
        }
        let rule = if scope.is_empty() && key == CATEGORY_KEY {
            MergeRule::Identity
        } else {
            spec.map(|s| s.rule).unwrap_or_default()
        };

        let present: Vec<(&Layer<'_>, &MetaValue)> = layers
            .iter()
            .filter_map(|l| l.map.get(key).filter(|v| !v.is_null()).map(|v| (l, v)))
            .collect();
        if present.is_empty() {
            continue;
        }

        let value = match rule {
            MergeRule::Override => present.last().map(|&(_, v)| v.clone()),
            MergeRule::Identity => present
                .iter()
                .filter(|(l, _)| l.is_leaf)
                .last()
                .map(|&(_, v)| v.clone()),
            MergeRule::UnionList => {
                let mut items: Vec<MetaValue> = Vec::new();
                for &(_, value) in &present {
                    let list = value
                        .as_list()
                        .ok_or_else(|| mismatch(source_path, &field, spec, value))?;
                    for item in list {
                        if !items.contains(item) {
                            items.push(item.clone());
                        }
                    }
                }
                Some(MetaValue::List(items))
            }
            MergeRule::DeepMap => {
                let mut sub_layers = Vec::new();
                for &(layer, value) in &present {
                    let map = value
                        .as_map()
                        .ok_or_else(|| mismatch(source_path, &field, spec, value))?;
                    sub_layers.push(Layer {
                        map,
                        is_leaf: layer.is_leaf,
                    });
                }
                let children = spec.map(|s| s.fields.as_slice()).unwrap_or_default();
                Some(MetaValue::Map(merge_layers(
                    &sub_layers,
                    children,
                    &format!("{field}."),
                    source_path,
                )?))
            }
        };

        if let Some(value) = value {
            merged.insert(key.clone(), value);
        }
    }

    Ok(merged)
}

fn check_kinds(
    merged: &Metadata,
    specs: &[FieldSpec],
    scope: &str,
    source_path: &str,
) -> Result<(), DomainError> {
    for spec in specs {
        let Some(value) = merged.get(&spec.name) else {
            continue;
        };
        let field = format!("{scope}{}", spec.name);
        if !value.matches(spec.kind) {
            return Err(mismatch(source_path, &field, Some(spec), value));
        }
        if let MetaValue::Map(children) = value {
            check_kinds(children, &spec.fields, &format!("{field}."), source_path)?;
        }
    }
    Ok(())
}

fn mismatch(
    source_path: &str,
    field: &str,
    spec: Option<&FieldSpec>,
    found: &MetaValue,
) -> DomainError {
    DomainError::TypeMismatch {
        source_path: source_path.to_string(),
        field: field.to_string(),
        expected: spec.map(|s| s.kind).unwrap_or_default(),
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::corpus::{CorpusIndex, tests::doc};
    use super::*;
    use crate::domain::value_objects::ValueKind;

    fn merged(docs: Vec<super::super::document::Document>) -> Result<Metadata, DomainError> {
        let index = CorpusIndex::build(docs).unwrap();
        let (leaf, _) = index.leaves().next().unwrap();
        index.chain_for(leaf).unwrap().merge_metadata(&Schema::agent())
    }

    fn list(items: &[&str]) -> MetaValue {
        MetaValue::List(items.iter().map(|s| MetaValue::from(*s)).collect())
    }

    #[test]
    fn union_list_concatenates_and_keeps_first_occurrence() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("tags", list(&["a"]))], ""),
            doc("cat/BASE-AGENT.md", &[("tags", list(&["b"]))], ""),
            doc("cat/leaf.md", &[("tags", list(&["c", "a"]))], ""),
        ])
        .unwrap();
        assert_eq!(meta["tags"], list(&["a", "b", "c"]));
    }

    #[test]
    fn override_takes_nearest_ancestor() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("temperature", 0.1.into())], ""),
            doc("cat/BASE-AGENT.md", &[("temperature", 0.2.into())], ""),
            doc("cat/leaf.md", &[], ""),
        ])
        .unwrap();
        assert_eq!(meta["temperature"], MetaValue::Float(0.2));
    }

    #[test]
    fn leaf_override_wins() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("temperature", 0.1.into())], ""),
            doc("cat/BASE-AGENT.md", &[("temperature", 0.2.into())], ""),
            doc("cat/leaf.md", &[("temperature", 0.5.into())], ""),
        ])
        .unwrap();
        assert_eq!(meta["temperature"], MetaValue::Float(0.5));
    }

    #[test]
    fn null_does_not_clear_inherited_value() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("model", "sonnet".into())], ""),
            doc("leaf.md", &[("model", MetaValue::Null)], ""),
        ])
        .unwrap();
        assert_eq!(meta["model"], MetaValue::from("sonnet"));
    }

    #[test]
    fn identity_comes_from_leaf_only() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("agent_id", "base-id".into())], ""),
            doc("leaf.md", &[], ""),
        ])
        .unwrap();
        assert!(!meta.contains_key("agent_id"));

        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("agent_id", "base-id".into())], ""),
            doc("leaf.md", &[("agent_id", "leaf-id".into())], ""),
        ])
        .unwrap();
        assert_eq!(meta["agent_id"], MetaValue::from("leaf-id"));
    }

    #[test]
    fn deep_map_merges_per_sub_key() {
        let base_knowledge = MetaValue::Map(BTreeMap::from([
            ("domain_expertise".to_string(), list(&["git"])),
            ("style".to_string(), "terse".into()),
        ]));
        let leaf_knowledge = MetaValue::Map(BTreeMap::from([
            ("domain_expertise".to_string(), list(&["python", "git"])),
            ("style".to_string(), "verbose".into()),
        ]));

        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("knowledge", base_knowledge)], ""),
            doc("leaf.md", &[("knowledge", leaf_knowledge)], ""),
        ])
        .unwrap();

        let knowledge = meta["knowledge"].as_map().unwrap();
        assert_eq!(knowledge["domain_expertise"], list(&["git", "python"]));
        assert_eq!(knowledge["style"], MetaValue::from("verbose"));
    }

    #[test]
    fn undeclared_keys_override() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("color", "blue".into())], ""),
            doc("leaf.md", &[("color", list(&["red"]))], ""),
        ])
        .unwrap();
        assert_eq!(meta["color"], list(&["red"]));
    }

    #[test]
    fn override_of_wrong_kind_is_a_merge_error() {
        let err = merged(vec![
            doc("BASE-AGENT.md", &[("temperature", 0.1.into())], ""),
            doc("leaf.md", &[("temperature", "hot".into())], ""),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::TypeMismatch {
                source_path: "leaf.md".into(),
                field: "temperature".into(),
                expected: ValueKind::Number,
                found: "text",
            }
        );
    }

    #[test]
    fn integer_satisfies_number_field() {
        let meta = merged(vec![doc(
            "leaf.md",
            &[("temperature", MetaValue::Int(1))],
            "",
        )])
        .unwrap();
        assert_eq!(meta["temperature"], MetaValue::Int(1));
    }

    #[test]
    fn null_only_collections_stay_absent() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[("knowledge", MetaValue::Null)], ""),
            doc("leaf.md", &[("tags", MetaValue::Null)], ""),
        ])
        .unwrap();
        assert!(!meta.contains_key("tags"));
        assert!(!meta.contains_key("knowledge"));
    }

    #[test]
    fn category_is_not_inherited() {
        let meta = merged(vec![
            doc("engineer/BASE-AGENT.md", &[("category", "engineer".into())], ""),
            doc("engineer/backend/python.md", &[], ""),
        ])
        .unwrap();
        assert!(!meta.contains_key("category"));

        let meta = merged(vec![
            doc("engineer/BASE-AGENT.md", &[("category", "engineer".into())], ""),
            doc(
                "engineer/python.md",
                &[("category", "engineer/backend".into())],
                "",
            ),
        ])
        .unwrap();
        assert_eq!(meta["category"], MetaValue::from("engineer/backend"));
    }

    #[test]
    fn extends_is_consumed_not_emitted() {
        let meta = merged(vec![
            doc("BASE-AGENT.md", &[], ""),
            doc("ops/BASE-AGENT.md", &[], ""),
            doc("engineer/deployer.md", &[("extends", "ops".into())], ""),
        ])
        .unwrap();
        assert!(!meta.contains_key("extends"));
    }

    #[test]
    fn merge_is_deterministic() {
        let build = || {
            merged(vec![
                doc("BASE-AGENT.md", &[("tags", list(&["x", "y"]))], ""),
                doc("leaf.md", &[("tags", list(&["z"])), ("name", "L".into())], ""),
            ])
            .unwrap()
        };
        assert_eq!(build(), build());
    }
}
