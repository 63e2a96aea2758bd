//! WAPI schema documents and the processed per-object profile.
//!
//! WAPI describes itself: `GET <base>?_schema` lists the supported objects,
//! and `GET <base>/<object>?_schema&_schema_version=2` returns one object's
//! restrictions, fields, and functions. The raw documents are loose about
//! shapes (`type` can be a string or a list, `supports` a flag string or a
//! map), so they are normalized into an [`ObjectProfile`] before use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Response of `GET <base>?_schema`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaIndex {
    #[serde(default)]
    pub supported_objects: Vec<String>,
    #[serde(default)]
    pub supported_versions: Vec<String>,
    #[serde(default)]
    pub requested_version: Option<String>,
}

/// A value WAPI sends either bare or wrapped in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// First (primary) entry.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::One(s) => Some(s.as_str()),
            Self::Many(v) => v.first().map(String::as_str),
        }
    }
}

/// The `supports` attribute of a field.
///
/// Schema version 2 uses a flag string such as `"rwus"`
/// (read, write, update, search); older caches carry a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Supports {
    Flags(String),
    Map(BTreeMap<String, bool>),
}

impl Supports {
    pub fn search(&self) -> bool {
        match self {
            Self::Flags(f) => f.contains('s'),
            Self::Map(m) => m.get("search").copied().unwrap_or(false),
        }
    }

    /// True when neither write nor update is offered.
    pub fn readonly(&self) -> bool {
        match self {
            Self::Flags(f) => !f.contains('w') && !f.contains('u'),
            Self::Map(m) => {
                !m.get("write").copied().unwrap_or(false)
                    && !m.get("update").copied().unwrap_or(false)
            }
        }
    }
}

/// One field entry of an object schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<OneOrMany>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub required_on_create: bool,
    #[serde(default)]
    pub supports: Option<Supports>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub readonly: bool,
}

/// Response of `GET <base>/<object>?_schema&_schema_version=2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(default)]
    pub restrictions: Vec<String>,
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub supported_functions: Vec<String>,
}

/// Normalized description of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub comment: String,
}

/// Which CRUD operations an object supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudSupport {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

/// Processed, cacheable form of one object schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProfile {
    pub object_name: String,
    pub fields: Vec<FieldInfo>,
    pub searchable_fields: Vec<String>,
    pub required_fields: Vec<String>,
    pub functions: Vec<String>,
    pub restrictions: Vec<String>,
    pub supports_crud: CrudSupport,
}

/// Why a schema document could not be turned into a profile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("field #{index} of '{object}' has no name")]
    UnnamedField { object: String, index: usize },

    #[error("object name is empty")]
    EmptyObjectName,
}

impl ObjectProfile {
    /// Normalize a raw schema document.
    ///
    /// A capability is supported iff its name appears in `restrictions`.
    pub fn from_schema(object_name: &str, schema: &ObjectSchema) -> Result<Self, ProfileError> {
        if object_name.trim().is_empty() {
            return Err(ProfileError::EmptyObjectName);
        }

        let mut fields = Vec::with_capacity(schema.fields.len());
        let mut searchable_fields = Vec::new();
        let mut required_fields = Vec::new();

        for (index, field) in schema.fields.iter().enumerate() {
            let name = field
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ProfileError::UnnamedField {
                    object: object_name.to_string(),
                    index,
                })?;

            let supports = field.supports.as_ref();
            let info = FieldInfo {
                field_type: field
                    .field_type
                    .as_ref()
                    .and_then(OneOrMany::primary)
                    .unwrap_or("string")
                    .to_string(),
                is_array: field.is_array,
                searchable: field.searchable || supports.is_some_and(Supports::search),
                required: field.required_on_create,
                readonly: field.readonly || supports.is_some_and(Supports::readonly),
                comment: field.comment.clone().unwrap_or_default(),
                name,
            };

            if info.searchable {
                searchable_fields.push(info.name.clone());
            }
            if info.required {
                required_fields.push(info.name.clone());
            }
            fields.push(info);
        }

        let has = |op: &str| schema.restrictions.iter().any(|r| r == op);

        Ok(Self {
            object_name: object_name.to_string(),
            fields,
            searchable_fields,
            required_fields,
            functions: schema.supported_functions.clone(),
            restrictions: schema.restrictions.clone(),
            supports_crud: CrudSupport {
                create: has("create"),
                read: has("read"),
                update: has("update"),
                delete: has("delete"),
            },
        })
    }
}
