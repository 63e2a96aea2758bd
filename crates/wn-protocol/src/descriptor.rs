use serde::{Deserialize, Serialize};

/// What an operation descriptor does to its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Find,
    Update,
    Delete,
    /// A WAPI `_function` call (e.g. `next_available_ip`).
    Function,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Find => "find",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Function => "function",
        }
    }

    /// Whether dispatch needs the object's `_ref` resolved first.
    pub fn needs_reference(&self) -> bool {
        matches!(self, Self::Update | Self::Delete | Self::Function)
    }
}

/// HTTP verb used against WAPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of tools for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Ipam,
    Dns,
    Dhcp,
    Grid,
    Other,
}

impl ToolCategory {
    /// Derive the category from a WAPI object name.
    pub fn for_object(object: &str) -> Self {
        if object.contains("network") || object.contains("fixedaddress") {
            Self::Ipam
        } else if object.contains("record") || object.contains("zone") || object.contains("nsgroup")
        {
            Self::Dns
        } else if object.contains("range") || object.contains("lease") {
            Self::Dhcp
        } else if object.contains("grid") || object.contains("member") {
            Self::Grid
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipam => "ipam",
            Self::Dns => "dns",
            Self::Dhcp => "dhcp",
            Self::Grid => "grid",
            Self::Other => "other",
        }
    }
}

/// A generated record describing one callable operation on one WAPI object.
///
/// `endpoint` is relative to the WAPI base URL and may contain a `{ref}`
/// placeholder, filled with the object reference resolved at dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub name: String,
    /// WAPI object type, e.g. `record:host`.
    pub object: String,
    pub kind: OperationKind,
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub description: String,
    pub category: ToolCategory,
    /// Function name for `OperationKind::Function` descriptors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// JSON schema of the tool input.
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// `record:host` → `record_host`.
pub fn object_slug(object: &str) -> String {
    object.replace(':', "_")
}

/// Tool name for a CRUD operation, e.g. `create_record_host`.
pub fn operation_name(kind: OperationKind, object: &str) -> String {
    format!("{}_{}", kind.as_str(), object_slug(object))
}

/// Tool name for a custom function, e.g. `next_available_ip_network`.
pub fn function_name(function: &str, object: &str) -> String {
    format!("{function}_{}", object_slug(object))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_replace_colons() {
        assert_eq!(
            operation_name(OperationKind::Create, "record:host"),
            "create_record_host"
        );
        assert_eq!(
            function_name("next_available_ip", "network"),
            "next_available_ip_network"
        );
    }

    #[test]
    fn categories_from_object_names() {
        assert_eq!(ToolCategory::for_object("network"), ToolCategory::Ipam);
        assert_eq!(ToolCategory::for_object("fixedaddress"), ToolCategory::Ipam);
        assert_eq!(ToolCategory::for_object("record:a"), ToolCategory::Dns);
        assert_eq!(ToolCategory::for_object("zone_auth"), ToolCategory::Dns);
        assert_eq!(ToolCategory::for_object("range"), ToolCategory::Dhcp);
        assert_eq!(ToolCategory::for_object("member"), ToolCategory::Grid);
        assert_eq!(ToolCategory::for_object("macfilteraddress"), ToolCategory::Other);
    }

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&HttpMethod::Delete).unwrap(), r#""DELETE""#);
        assert_eq!(
            serde_json::to_string(&OperationKind::Function).unwrap(),
            r#""function""#
        );
    }

    #[test]
    fn reference_needed_for_mutations() {
        assert!(OperationKind::Update.needs_reference());
        assert!(OperationKind::Delete.needs_reference());
        assert!(!OperationKind::Find.needs_reference());
        assert!(!OperationKind::Create.needs_reference());
    }
}
