//! Entity schemas
//!
//! An [`EntitySchema`] describes one manageable entity type: its REST
//! resource, which field identifies a record, and the ordered list of form
//! fields with their validation rules. Schemas are plain configuration and can
//! be declared in code (see [`crate::catalog`]) or loaded from TOML.

use std::collections::HashSet;

use miette::Diagnostic;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a schema
#[derive(Error, Diagnostic, Debug)]
pub enum SchemaError {
    #[error("Entity '{entity}' declares no fields")]
    #[diagnostic(code(backoffice_core::schema::no_fields))]
    NoFields { entity: String },

    #[error("Entity '{entity}' declares field '{field}' more than once")]
    #[diagnostic(code(backoffice_core::schema::duplicate_field))]
    DuplicateField { entity: String, field: String },

    #[error("Primary key '{field}' is not a field of '{entity}'")]
    #[diagnostic(
        code(backoffice_core::schema::unknown_primary_key),
        help("The primary key must be one of the declared fields")
    )]
    UnknownPrimaryKey { entity: String, field: String },

    #[error("Boolean field '{field}' of '{entity}' cannot be required")]
    #[diagnostic(
        code(backoffice_core::schema::required_boolean),
        help("A checkbox always has a value; drop `required` from this field")
    )]
    RequiredBoolean { entity: String, field: String },

    #[error("Versioning field '{field}' is not a field of '{entity}'")]
    #[diagnostic(code(backoffice_core::schema::unknown_versioning_field))]
    UnknownVersioningField { entity: String, field: String },

    #[error("Locked code field '{field}' is not a field of '{entity}'")]
    #[diagnostic(
        code(backoffice_core::schema::unknown_locked_code),
        help("`locked_code` must name one of the declared fields")
    )]
    UnknownLockedCode { entity: String, field: String },

    #[error("Invalid pattern for '{entity}.{field}'")]
    #[diagnostic(code(backoffice_core::schema::invalid_pattern))]
    InvalidPattern {
        entity: String,
        field: String,
        #[source]
        cause: regex::Error,
    },

    #[error("Entity '{entity}' is not versioned")]
    #[diagnostic(
        code(backoffice_core::schema::not_versioned),
        help("Add a `versioning` section naming the code and applicable-from fields")
    )]
    NotVersioned { entity: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Input kind of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
}

/// How a record's primary key is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Assigned by the backend; never entered by the user
    #[default]
    Surrogate,
    /// A business code entered by the user
    Natural,
}

/// Declaration of a single form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regular expression the whole value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default)]
    pub unique_among_existing: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            required: false,
            max_length: None,
            pattern: None,
            unique_among_existing: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique_among_existing = true;
        self
    }

    /// Label shown to the user, falling back to the field name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Marks an entity as versioned configuration for the applicable-from resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioning {
    /// Business code shared by all versions
    pub code_field: String,
    /// Date the version takes effect
    pub effective_from_field: String,
}

/// Serializable form of a schema, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchemaDef {
    pub name: String,
    pub resource: String,
    pub primary_key: String,

    #[serde(default)]
    pub key_kind: KeyKind,

    /// Business code that becomes read-only once a record is picked for editing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_code: Option<String>,

    pub fields: Vec<FieldSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Versioning>,
}

impl EntitySchemaDef {
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            primary_key: primary_key.into(),
            key_kind: KeyKind::default(),
            locked_code: None,
            fields: Vec::new(),
            versioning: None,
        }
    }

    pub fn key_kind(mut self, key_kind: KeyKind) -> Self {
        self.key_kind = key_kind;
        self
    }

    pub fn lock_code_on_edit(mut self, code_field: impl Into<String>) -> Self {
        self.locked_code = Some(code_field.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn versioned(
        mut self,
        code_field: impl Into<String>,
        effective_from_field: impl Into<String>,
    ) -> Self {
        self.versioning = Some(Versioning {
            code_field: code_field.into(),
            effective_from_field: effective_from_field.into(),
        });
        self
    }

    pub fn build(self) -> Result<EntitySchema> {
        EntitySchema::try_from(self)
    }
}

/// A validated entity schema with compiled field patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "EntitySchemaDef", into = "EntitySchemaDef")]
pub struct EntitySchema {
    def: EntitySchemaDef,
    /// Anchored patterns, index-aligned with `def.fields`
    patterns: Vec<Option<Regex>>,
}

impl TryFrom<EntitySchemaDef> for EntitySchema {
    type Error = SchemaError;

    fn try_from(def: EntitySchemaDef) -> Result<Self> {
        if def.fields.is_empty() {
            return Err(SchemaError::NoFields { entity: def.name });
        }

        let mut seen = HashSet::new();
        for field in &def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.required && field.kind == FieldKind::Boolean {
                return Err(SchemaError::RequiredBoolean {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        if !seen.contains(def.primary_key.as_str()) {
            return Err(SchemaError::UnknownPrimaryKey {
                entity: def.name.clone(),
                field: def.primary_key.clone(),
            });
        }

        if let Some(field) = &def.locked_code
            && !seen.contains(field.as_str())
        {
            return Err(SchemaError::UnknownLockedCode {
                entity: def.name.clone(),
                field: field.clone(),
            });
        }

        if let Some(versioning) = &def.versioning {
            for field in [&versioning.code_field, &versioning.effective_from_field] {
                if !seen.contains(field.as_str()) {
                    return Err(SchemaError::UnknownVersioningField {
                        entity: def.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        let patterns = def
            .fields
            .iter()
            .map(|field| {
                field
                    .pattern
                    .as_deref()
                    .map(|pattern| {
                        Regex::new(&format!("^(?:{pattern})$")).map_err(|cause| {
                            SchemaError::InvalidPattern {
                                entity: def.name.clone(),
                                field: field.name.clone(),
                                cause,
                            }
                        })
                    })
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { def, patterns })
    }
}

impl From<EntitySchema> for EntitySchemaDef {
    fn from(schema: EntitySchema) -> Self {
        schema.def
    }
}

impl PartialEq for EntitySchema {
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

impl EntitySchema {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn resource(&self) -> &str {
        &self.def.resource
    }

    pub fn primary_key(&self) -> &str {
        &self.def.primary_key
    }

    pub fn key_kind(&self) -> KeyKind {
        self.def.key_kind
    }

    pub fn code_lock_on_edit(&self) -> bool {
        self.def.locked_code.is_some()
    }

    /// The field that is read-only while editing an existing record
    pub fn locked_code(&self) -> Option<&str> {
        self.def.locked_code.as_deref()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.def.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.def.fields.iter().find(|f| f.name == name)
    }

    pub fn versioning(&self) -> Option<&Versioning> {
        self.def.versioning.as_ref()
    }

    pub fn require_versioning(&self) -> Result<&Versioning> {
        self.versioning().ok_or_else(|| SchemaError::NotVersioned {
            entity: self.def.name.clone(),
        })
    }

    pub fn definition(&self) -> &EntitySchemaDef {
        &self.def
    }

    /// Whether `name` is the backend-assigned key
    pub fn is_surrogate_key(&self, name: &str) -> bool {
        self.def.key_kind == KeyKind::Surrogate && self.def.primary_key == name
    }

    /// Fields with their compiled patterns, in declaration order
    pub(crate) fn rules(&self) -> impl Iterator<Item = (&FieldSpec, Option<&Regex>)> {
        self.def
            .fields
            .iter()
            .zip(self.patterns.iter().map(Option::as_ref))
    }
}
