use std::collections::{BTreeMap, BTreeSet};

use crate::domain::diagnostics::{Diagnostic, DiagnosticCode};
use crate::domain::entities::{ComposedBody, CorpusIndex, MetaValue, Metadata};
use crate::domain::schema::{FieldSpec, Schema};

/// Settings shared by every per-document check.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub schema: &'a Schema,
    /// Identity values, full paths, and names of every leaf.
    pub known_references: &'a BTreeSet<String>,
    /// Report unresolved references as warnings instead of errors.
    pub lenient_references: bool,
    pub min_body_chars: usize,
}

/// A successfully merged leaf, as seen by the corpus-wide pass.
#[derive(Debug, Clone, Copy)]
pub struct MergedLeaf<'a> {
    pub location: &'a str,
    pub metadata: &'a Metadata,
}

/// Centralized domain validation.
///
/// Per-document checks run independently per leaf; corpus checks run once
/// after every leaf has been merged.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_document(
        ctx: &ValidationContext<'_>,
        location: &str,
        metadata: &Metadata,
        body: &ComposedBody,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        check_fields(
            ctx,
            location,
            metadata,
            ctx.schema.fields(),
            "",
            &mut diagnostics,
        );

        let len = body.text_len();
        if len < ctx.min_body_chars {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ThinBody,
                location,
                format!(
                    "composed body has {len} characters, expected at least {}",
                    ctx.min_body_chars
                ),
            ));
        }

        diagnostics
    }

    pub fn validate_corpus(
        schema: &Schema,
        index: &CorpusIndex,
        leaves: &[MergedLeaf<'_>],
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for field in schema.identity_fields() {
            let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for leaf in leaves {
                if let Some(value) = leaf.metadata.get(&field.name).filter(|v| !v.is_empty()) {
                    owners
                        .entry(value.to_string())
                        .or_default()
                        .push(leaf.location.to_string());
                }
            }

            for (value, mut locations) in owners {
                if locations.len() < 2 {
                    continue;
                }
                locations.sort();
                let message = format!(
                    "{} '{value}' is declared by {} documents: {}",
                    field.name,
                    locations.len(),
                    locations.join(", ")
                );
                diagnostics.push(
                    Diagnostic::error(DiagnosticCode::DuplicateIdentity, "", message)
                        .with_locations(locations),
                );
            }
        }

        for (idx, base) in index.bases() {
            if index.descendants_of(idx) == 0 {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::UnusedBase,
                    base.location(),
                    format!("base at {} has no descendants", base.path()),
                ));
            }
        }

        diagnostics
    }
}

fn check_fields(
    ctx: &ValidationContext<'_>,
    location: &str,
    metadata: &Metadata,
    specs: &[FieldSpec],
    scope: &str,
    out: &mut Vec<Diagnostic>,
) {
    for spec in specs {
        let field = format!("{scope}{}", spec.name);

        let value = match metadata.get(&spec.name) {
            Some(value) if value.is_empty() => {
                if spec.required {
                    out.push(Diagnostic::error(
                        DiagnosticCode::EmptyField,
                        location,
                        format!("required field '{field}' is empty"),
                    ));
                } else if spec.recommended {
                    out.push(recommended(location, &field));
                }
                continue;
            }
            Some(value) => value,
            None => {
                if spec.required {
                    out.push(Diagnostic::error(
                        DiagnosticCode::MissingField,
                        location,
                        format!("required field '{field}' is missing"),
                    ));
                } else if spec.recommended {
                    out.push(recommended(location, &field));
                }
                continue;
            }
        };

        if !spec.allowed.is_empty() {
            for item in scalars(value) {
                let text = item.to_string();
                if !spec.allowed.contains(&text) {
                    out.push(Diagnostic::error(
                        DiagnosticCode::InvalidEnum,
                        location,
                        format!("'{field}' has invalid value '{text}'"),
                    ));
                }
            }
        }

        if let Some(bounds) = spec.bounds {
            for number in scalars(value).filter_map(MetaValue::as_f64) {
                if !bounds.contains(number) {
                    out.push(Diagnostic::error(
                        DiagnosticCode::OutOfBounds,
                        location,
                        format!(
                            "'{field}' is {number}, outside {}..={}",
                            bounds.min, bounds.max
                        ),
                    ));
                }
            }
        }

        if spec.reference {
            for target in scalars(value) {
                let name = target.to_string();
                if !ctx.known_references.contains(&name) {
                    let message = format!("'{field}' names unknown document '{name}'");
                    out.push(if ctx.lenient_references {
                        Diagnostic::warning(DiagnosticCode::UnresolvedReference, location, message)
                    } else {
                        Diagnostic::error(DiagnosticCode::UnresolvedReference, location, message)
                    });
                }
            }
        }

        if let MetaValue::Map(children) = value {
            check_fields(
                ctx,
                location,
                children,
                &spec.fields,
                &format!("{field}."),
                out,
            );
        }
    }
}

fn recommended(location: &str, field: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticCode::MissingRecommended,
        location,
        format!("no '{field}' defined"),
    )
}

/// The value itself, or its items if it is a list.
fn scalars(value: &MetaValue) -> Box<dyn Iterator<Item = &MetaValue> + '_> {
    match value {
        MetaValue::List(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::corpus::tests::doc;

    fn valid_metadata() -> Metadata {
        Metadata::from([
            ("name".to_string(), MetaValue::from("Python Engineer")),
            ("description".to_string(), "Writes Python".into()),
            ("agent_id".to_string(), "python-engineer".into()),
            ("agent_type".to_string(), "engineer".into()),
            ("skills".to_string(), vec!["pytest"].into()),
        ])
    }

    fn body(text: &str) -> ComposedBody {
        let index = CorpusIndex::build(vec![doc("leaf.md", &[], text)]).unwrap();
        let (leaf, _) = index.leaves().next().unwrap();
        index.chain_for(leaf).unwrap().compose_body()
    }

    fn run(metadata: &Metadata, refs: &[&str], lenient: bool) -> Vec<Diagnostic> {
        let schema = Schema::agent();
        let known: BTreeSet<String> = refs.iter().map(|s| s.to_string()).collect();
        let ctx = ValidationContext {
            schema: &schema,
            known_references: &known,
            lenient_references: lenient,
            min_body_chars: 10,
        };
        DomainValidator::validate_document(&ctx, "leaf.md", metadata, &body("a body long enough"))
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn valid_document_has_no_diagnostics() {
        assert!(run(&valid_metadata(), &[], false).is_empty());
    }

    #[test]
    fn reports_missing_and_empty_required_fields() {
        let mut metadata = valid_metadata();
        metadata.remove("name");
        metadata.insert("description".into(), "   ".into());

        let found = codes(&run(&metadata, &[], false));
        assert!(found.contains(&DiagnosticCode::MissingField));
        assert!(found.contains(&DiagnosticCode::EmptyField));
    }

    #[test]
    fn rejects_values_outside_enum() {
        let mut metadata = valid_metadata();
        metadata.insert("agent_type".into(), "wizard".into());
        assert_eq!(codes(&run(&metadata, &[], false)), vec![DiagnosticCode::InvalidEnum]);
    }

    #[test]
    fn rejects_numbers_outside_bounds() {
        let mut metadata = valid_metadata();
        metadata.insert("temperature".into(), 1.5.into());
        metadata.insert("max_tokens".into(), MetaValue::Int(0));
        let found = codes(&run(&metadata, &[], false));
        assert_eq!(found, vec![DiagnosticCode::OutOfBounds, DiagnosticCode::OutOfBounds]);
    }

    #[test]
    fn unresolved_reference_severity_follows_leniency() {
        let mut metadata = valid_metadata();
        metadata.insert(
            "interactions".into(),
            MetaValue::Map(BTreeMap::from([(
                "handoff_to".to_string(),
                vec!["qa", "ghost"].into(),
            )])),
        );

        let strict = run(&metadata, &["qa"], false);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].is_error());
        assert!(strict[0].message.contains("ghost"));

        let lenient = run(&metadata, &["qa"], true);
        assert_eq!(lenient.len(), 1);
        assert!(!lenient[0].is_error());
    }

    #[test]
    fn warns_on_missing_skills_and_thin_body() {
        let mut metadata = valid_metadata();
        metadata.remove("skills");

        let schema = Schema::agent();
        let known = BTreeSet::new();
        let ctx = ValidationContext {
            schema: &schema,
            known_references: &known,
            lenient_references: false,
            min_body_chars: 50,
        };
        let diagnostics =
            DomainValidator::validate_document(&ctx, "leaf.md", &metadata, &body("tiny"));

        assert_eq!(
            codes(&diagnostics),
            vec![DiagnosticCode::MissingRecommended, DiagnosticCode::ThinBody]
        );
        assert!(diagnostics.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn duplicate_identity_names_every_location_once() {
        let index = CorpusIndex::build(vec![
            doc("a.md", &[], ""),
            doc("b.md", &[], ""),
        ])
        .unwrap();
        let first = Metadata::from([("agent_id".to_string(), MetaValue::from("python-engineer"))]);
        let second = first.clone();
        let leaves = [
            MergedLeaf {
                location: "b.md",
                metadata: &second,
            },
            MergedLeaf {
                location: "a.md",
                metadata: &first,
            },
        ];

        let diagnostics = DomainValidator::validate_corpus(&Schema::agent(), &index, &leaves);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::DuplicateIdentity);
        assert_eq!(diagnostics[0].locations, vec!["a.md", "b.md"]);
    }

    #[test]
    fn warns_on_base_without_descendants() {
        let index = CorpusIndex::build(vec![
            doc("orphan/BASE-AGENT.md", &[], ""),
            doc("leaf.md", &[], ""),
        ])
        .unwrap();

        let diagnostics = DomainValidator::validate_corpus(&Schema::agent(), &index, &[]);
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnusedBase]);
        assert_eq!(diagnostics[0].primary_location(), "orphan/BASE-AGENT.md");
    }
}
