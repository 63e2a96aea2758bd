//! Object profiles → operation descriptors.

use serde_json::{Map, Value, json};
use wn_protocol::{
    FieldInfo, HttpMethod, ObjectProfile, OperationDescriptor, OperationKind, ToolCategory,
    function_name, operation_name,
};

/// Example phrases per (object, operation). Anything missing falls back to
/// a generated phrase.
const EXAMPLES: &[(&str, &str, &str)] = &[
    ("network", "create", "Create network 10.0.0.0/24 with comment \"Production Network\""),
    ("network", "find", "Find all networks containing IP 10.0.0.100"),
    ("network", "update", "Update network 10.0.0.0/24 comment to \"Updated Network\""),
    ("network", "delete", "Delete network 10.0.0.0/24"),
    ("network", "next_available_ip", "Get next available IP in network 10.0.0.0/24"),
    ("record:host", "create", "Create host record server1.example.com with IP 192.168.1.100"),
    ("record:host", "find", "Find all host records in zone example.com"),
    ("record:host", "update", "Update host record server1.example.com to IP 192.168.1.101"),
    ("record:host", "delete", "Delete host record server1.example.com"),
    ("record:a", "create", "Create A record www.example.com pointing to 192.168.1.50"),
    ("record:a", "find", "Find A record for www.example.com"),
    ("record:a", "update", "Update A record www.example.com to 192.168.1.51"),
    ("record:a", "delete", "Delete A record www.example.com"),
];

/// Example phrase for an operation (`create`, `find`, ..., or a function name).
pub fn example_for(object: &str, operation: &str) -> String {
    EXAMPLES
        .iter()
        .find(|(o, op, _)| *o == object && *op == operation)
        .map(|(_, _, phrase)| phrase.to_string())
        .unwrap_or_else(|| {
            let words = operation.replace('_', " ");
            let mut chars = words.chars();
            let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
            format!("{head}{} {object}", chars.as_str())
        })
}

/// Builds descriptors from object profiles.
#[derive(Debug, Clone)]
pub struct ToolGenerator {
    max_results: u32,
}

impl Default for ToolGenerator {
    fn default() -> Self {
        Self { max_results: 100 }
    }
}

impl ToolGenerator {
    pub fn new(max_results: u32) -> Self {
        Self { max_results }
    }

    /// Descriptors for every profile, objects in name order.
    pub fn generate(&self, profiles: &[ObjectProfile]) -> Vec<OperationDescriptor> {
        let mut sorted: Vec<&ObjectProfile> = profiles.iter().collect();
        sorted.sort_by(|a, b| a.object_name.cmp(&b.object_name));

        let mut tools = Vec::new();
        for profile in sorted {
            if profile.object_name.trim().is_empty() {
                tracing::warn!("skipping profile without object name");
                continue;
            }
            let before = tools.len();
            self.generate_object(profile, &mut tools);
            tracing::debug!(
                object = %profile.object_name,
                tools = tools.len() - before,
                "generated tools"
            );
        }
        tracing::info!(objects = profiles.len(), tools = tools.len(), "tool generation finished");
        tools
    }

    fn generate_object(&self, profile: &ObjectProfile, out: &mut Vec<OperationDescriptor>) {
        let crud = profile.supports_crud;
        if crud.create {
            out.push(self.create(profile));
        }
        if crud.read {
            out.push(self.find(profile));
        }
        if crud.update {
            out.push(self.update(profile));
        }
        if crud.delete {
            out.push(self.delete(profile));
        }
        for function in &profile.functions {
            out.push(self.function(profile, function));
        }
    }

    fn base(
        &self,
        profile: &ObjectProfile,
        kind: OperationKind,
        method: HttpMethod,
        endpoint: String,
    ) -> OperationDescriptor {
        let object = &profile.object_name;
        OperationDescriptor {
            name: operation_name(kind, object),
            object: object.clone(),
            kind,
            method,
            endpoint,
            fields: Vec::new(),
            required_fields: Vec::new(),
            searchable_fields: profile.searchable_fields.clone(),
            example: example_for(object, kind.as_str()),
            description: String::new(),
            category: ToolCategory::for_object(object),
            function: None,
            parameters: Value::Null,
        }
    }

    fn create(&self, profile: &ObjectProfile) -> OperationDescriptor {
        let object = &profile.object_name;
        let mut d = self.base(profile, OperationKind::Create, HttpMethod::Post, format!("/{object}"));

        let fields: Vec<&FieldInfo> = profile.fields.iter().filter(|f| f.name != "_ref").collect();
        let properties: Map<String, Value> = fields
            .iter()
            .map(|f| (f.name.clone(), field_schema(f)))
            .collect();

        d.fields = fields.iter().map(|f| f.name.clone()).collect();
        d.required_fields = profile.required_fields.clone();
        d.description = format!("Create a new {object} object in InfoBlox. {}", d.example);
        d.parameters = object_schema(properties, &d.required_fields);
        d
    }

    fn find(&self, profile: &ObjectProfile) -> OperationDescriptor {
        let object = &profile.object_name;
        let mut d = self.base(profile, OperationKind::Find, HttpMethod::Get, format!("/{object}"));

        let mut properties = Map::new();
        properties.insert(
            "_max_results".into(),
            json!({
                "type": "integer",
                "description": "Maximum results to return",
                "default": self.max_results,
            }),
        );
        for field in &profile.searchable_fields {
            properties.insert(
                field.clone(),
                json!({"type": "string", "description": format!("Search by {field}")}),
            );
        }

        d.fields = profile.searchable_fields.clone();
        d.description = format!("Search for {object} objects in InfoBlox. {}", d.example);
        d.parameters = object_schema(properties, &[]);
        d
    }

    fn update(&self, profile: &ObjectProfile) -> OperationDescriptor {
        let object = &profile.object_name;
        let mut d = self.base(profile, OperationKind::Update, HttpMethod::Put, "/{ref}".into());

        let mut properties = reference_property("Object reference to update");
        for field in profile.fields.iter().filter(|f| f.name != "_ref" && !f.readonly) {
            properties.insert(
                field.name.clone(),
                json!({"type": "string", "description": format!("Update {}", field.name)}),
            );
            d.fields.push(field.name.clone());
        }

        d.description = format!("Update an existing {object} object. {}", d.example);
        d.parameters = object_schema(properties, &["_ref".to_string()]);
        d
    }

    fn delete(&self, profile: &ObjectProfile) -> OperationDescriptor {
        let object = &profile.object_name;
        let mut d = self.base(profile, OperationKind::Delete, HttpMethod::Delete, "/{ref}".into());
        d.description = format!("Delete a {object} object. {}", d.example);
        d.parameters = object_schema(
            reference_property("Object reference to delete"),
            &["_ref".to_string()],
        );
        d
    }

    fn function(&self, profile: &ObjectProfile, function: &str) -> OperationDescriptor {
        let object = &profile.object_name;
        let mut d = self.base(
            profile,
            OperationKind::Function,
            HttpMethod::Post,
            format!("/{{ref}}?_function={function}"),
        );
        d.name = function_name(function, object);
        d.example = example_for(object, function);
        d.function = Some(function.to_string());
        d.description = format!("Execute {function} function on {object}");
        d.parameters = object_schema(reference_property("Object reference"), &[]);
        d
    }
}

fn reference_property(description: &str) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "_ref".into(),
        json!({"type": "string", "description": description}),
    );
    properties
}

fn object_schema(properties: Map<String, Value>, required: &[String]) -> Value {
    let mut schema = json!({"type": "object", "properties": properties});
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn field_schema(field: &FieldInfo) -> Value {
    let description = if field.comment.is_empty() {
        format!("{} field", field.name)
    } else {
        field.comment.clone()
    };

    if field.is_array {
        return json!({
            "type": "array",
            "items": {"type": "string"},
            "description": description,
        });
    }
    let kind = match field.field_type.as_str() {
        "bool" => "boolean",
        "int" | "uint" => "integer",
        _ => "string",
    };
    json!({"type": kind, "description": description})
}
