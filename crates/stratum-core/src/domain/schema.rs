//! Field declarations: merge rule, value kind, and validation constraints.
//!
//! Schema order is the canonical emission order. Keys a schema does not
//! declare merge as `override` with kind `any`.

use crate::domain::error::DomainError;
use crate::domain::value_objects::{MergeRule, ValueKind};

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Declaration of one metadata key.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub rule: MergeRule,
    pub kind: ValueKind,
    pub required: bool,
    /// Warn (rather than fail) when absent.
    pub recommended: bool,
    /// Allowed values; empty means unrestricted.
    pub allowed: Vec<String>,
    pub bounds: Option<Bounds>,
    /// Values name other leaves in the corpus.
    pub reference: bool,
    /// Sub-key declarations for `deep-map` fields.
    pub fields: Vec<FieldSpec>,
}

impl FieldSpec {
    fn base(name: impl Into<String>, rule: MergeRule, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            rule,
            kind,
            required: false,
            recommended: false,
            allowed: Vec::new(),
            bounds: None,
            reference: false,
            fields: Vec::new(),
        }
    }

    pub fn overriding(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::base(name, MergeRule::Override, kind)
    }

    pub fn union_list(name: impl Into<String>) -> Self {
        Self::base(name, MergeRule::UnionList, ValueKind::List)
    }

    pub fn deep_map(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ..Self::base(name, MergeRule::DeepMap, ValueKind::Map)
        }
    }

    pub fn identity(name: impl Into<String>) -> Self {
        Self::base(name, MergeRule::Identity, ValueKind::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn recommended(mut self) -> Self {
        self.recommended = true;
        self
    }

    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some(Bounds { min, max });
        self
    }

    pub fn reference(mut self) -> Self {
        self.reference = true;
        self
    }

    /// Sub-key declaration, if this is a deep-map field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        find_field(&self.fields, name)
    }
}

/// Declaration of `name` among `fields`.
pub fn find_field<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == name)
}

/// Position of `name` in canonical order; undeclared names sort last.
pub fn canonical_position(fields: &[FieldSpec], name: &str) -> usize {
    fields
        .iter()
        .position(|f| f.name == name)
        .unwrap_or(fields.len())
}

/// Ordered set of field declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build a schema, rejecting duplicate names and rule/kind combinations
    /// the merger cannot honor.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, DomainError> {
        check_fields(&fields, "")?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        find_field(&self.fields, name)
    }

    /// Top-level identity fields, in schema order.
    pub fn identity_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.rule == MergeRule::Identity)
    }

    /// Position of a key in canonical order; undeclared keys sort last.
    pub fn position(&self, name: &str) -> usize {
        canonical_position(&self.fields, name)
    }

    /// The agent-template schema.
    pub fn agent() -> Self {
        Self {
            fields: vec![
                FieldSpec::overriding("name", ValueKind::Text).required(),
                FieldSpec::overriding("description", ValueKind::Text).required(),
                FieldSpec::identity("agent_id").required(),
                FieldSpec::overriding("agent_type", ValueKind::Text)
                    .required()
                    .allowed(AGENT_TYPES.iter().copied()),
                FieldSpec::overriding("version", ValueKind::Text),
                FieldSpec::overriding("extends", ValueKind::Text),
                FieldSpec::overriding("category", ValueKind::Text),
                FieldSpec::overriding("model", ValueKind::Text),
                FieldSpec::overriding("temperature", ValueKind::Number).bounds(0.0, 1.0),
                FieldSpec::overriding("max_tokens", ValueKind::Integer).bounds(1.0, 1_000_000.0),
                FieldSpec::union_list("skills").recommended(),
                FieldSpec::union_list("tags"),
                FieldSpec::deep_map(
                    "knowledge",
                    vec![
                        FieldSpec::union_list("domain_expertise"),
                        FieldSpec::union_list("best_practices"),
                        FieldSpec::union_list("constraints"),
                    ],
                ),
                FieldSpec::deep_map(
                    "interactions",
                    vec![
                        FieldSpec::union_list("handoff_to").reference(),
                        FieldSpec::overriding("input_format", ValueKind::Any),
                        FieldSpec::overriding("output_format", ValueKind::Any),
                    ],
                ),
                FieldSpec::deep_map(
                    "dependencies",
                    vec![
                        FieldSpec::union_list("python"),
                        FieldSpec::union_list("system"),
                    ],
                ),
            ],
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::agent()
    }
}

/// Valid `agent_type` values.
pub const AGENT_TYPES: &[&str] = &[
    "engineer",
    "qa",
    "ops",
    "security",
    "research",
    "documentation",
    "devops",
    "data",
    "frontend",
    "backend",
    "mobile",
    "infra",
    "platform",
    "sre",
    "pm",
    "universal",
    "agent_manager",
    "skills_manager",
    "memory_manager",
    "content",
    "imagemagick",
    "product",
    "system",
    "claude-mpm",
    "analysis",
    "refactoring",
    "specialized",
];

fn check_fields(fields: &[FieldSpec], scope: &str) -> Result<(), DomainError> {
    for (i, field) in fields.iter().enumerate() {
        let qualified = format!("{scope}{}", field.name);

        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(DomainError::InvalidSchema(format!(
                "'{qualified}' declared twice"
            )));
        }

        let kind_ok = match field.rule {
            MergeRule::UnionList => field.kind == ValueKind::List,
            MergeRule::DeepMap => field.kind == ValueKind::Map,
            MergeRule::Identity | MergeRule::Override => true,
        };
        if !kind_ok {
            return Err(DomainError::InvalidSchema(format!(
                "'{qualified}' is {} but declared as {}",
                field.rule, field.kind
            )));
        }

        if field.rule == MergeRule::Identity && !scope.is_empty() {
            return Err(DomainError::InvalidSchema(format!(
                "'{qualified}': identity fields must be top level"
            )));
        }

        if !field.fields.is_empty() && field.rule != MergeRule::DeepMap {
            return Err(DomainError::InvalidSchema(format!(
                "'{qualified}' has sub-fields but is not deep-map"
            )));
        }

        check_fields(&field.fields, &format!("{qualified}."))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_schema_is_well_formed() {
        let schema = Schema::agent();
        assert!(Schema::new(schema.fields().to_vec()).is_ok());
    }

    #[test]
    fn agent_schema_declares_identity_and_required_keys() {
        let schema = Schema::agent();
        let identities: Vec<_> = schema.identity_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(identities, vec!["agent_id"]);
        assert!(schema.field("name").unwrap().required);
        assert_eq!(schema.field("tags").unwrap().rule, MergeRule::UnionList);
        assert!(schema.field("undeclared").is_none());
        let knowledge = schema.field("knowledge").unwrap();
        assert_eq!(knowledge.field("constraints").unwrap().rule, MergeRule::UnionList);
    }

    #[test]
    fn canonical_position_puts_undeclared_last() {
        let schema = Schema::agent();
        assert_eq!(schema.position("name"), 0);
        assert!(schema.position("zzz") > schema.position("dependencies"));
    }

    #[test]
    fn rejects_union_list_with_scalar_kind() {
        let mut field = FieldSpec::union_list("tags");
        field.kind = ValueKind::Text;
        assert!(Schema::new(vec![field]).is_err());
    }

    #[test]
    fn rejects_nested_identity() {
        let schema = Schema::new(vec![FieldSpec::deep_map(
            "meta",
            vec![FieldSpec::identity("id")],
        )]);
        assert!(matches!(schema, Err(DomainError::InvalidSchema(_))));
    }

    #[test]
    fn rejects_duplicate_names() {
        let schema = Schema::new(vec![
            FieldSpec::union_list("tags"),
            FieldSpec::overriding("tags", ValueKind::Text),
        ]);
        assert!(schema.is_err());
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = Bounds { min: 0.0, max: 1.0 };
        assert!(bounds.contains(0.0));
        assert!(bounds.contains(1.0));
        assert!(!bounds.contains(1.01));
    }
}
