//! Live set of operation descriptors, indexed by name.
//!
//! The server classifies queries against [`ToolRegistry::names`] and
//! dispatches through [`ToolRegistry::lookup`]. The discovery worker swaps
//! the whole set with [`ToolRegistry::replace_all`] after each refresh.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use wn_protocol::{CrudSupport, FieldInfo, ObjectProfile, OperationDescriptor};

use crate::generator::ToolGenerator;

/// Registry shared between request handlers and the discovery worker.
pub type SharedRegistry = Arc<RwLock<ToolRegistry>>;

#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<OperationDescriptor>,
    /// Map from tool name → index into `tools`.
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build from descriptors. The first descriptor of a given name wins.
    pub fn new(descriptors: Vec<OperationDescriptor>) -> Self {
        let mut tools = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::new();

        for descriptor in descriptors {
            if index.contains_key(&descriptor.name) {
                tracing::warn!(tool = %descriptor.name, "duplicate tool name ignored");
                continue;
            }
            index.insert(descriptor.name.clone(), tools.len());
            tools.push(descriptor);
        }

        Self { tools, index }
    }

    /// Built-in network, host record and A record tools, available before
    /// any discovery has run.
    pub fn with_defaults() -> Self {
        Self::new(ToolGenerator::default().generate(&builtin_profiles()))
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn lookup(&self, name: &str) -> Option<&OperationDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn list(&self) -> &[OperationDescriptor] {
        &self.tools
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Tools grouped by category name.
    pub fn by_category(&self) -> BTreeMap<String, Vec<&OperationDescriptor>> {
        let mut groups: BTreeMap<String, Vec<&OperationDescriptor>> = BTreeMap::new();
        for tool in &self.tools {
            groups
                .entry(tool.category.as_str().to_string())
                .or_default()
                .push(tool);
        }
        groups
    }

    /// Example phrases of every tool, for suggestions.
    pub fn examples(&self) -> Vec<String> {
        self.tools
            .iter()
            .filter(|t| !t.example.is_empty())
            .map(|t| t.example.clone())
            .collect()
    }

    /// Number of distinct objects covered.
    pub fn object_count(&self) -> usize {
        self.tools
            .iter()
            .map(|t| t.object.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn replace_all(&mut self, descriptors: Vec<OperationDescriptor>) {
        *self = Self::new(descriptors);
        tracing::info!(tools = self.tools.len(), "tool registry replaced");
    }
}

fn field(name: &str, required: bool, searchable: bool) -> FieldInfo {
    FieldInfo {
        name: name.into(),
        field_type: "string".into(),
        is_array: false,
        searchable,
        required,
        readonly: false,
        comment: String::new(),
    }
}

fn builtin_profile(object: &str, fields: Vec<FieldInfo>, crud: CrudSupport) -> ObjectProfile {
    let names = |pick: fn(&FieldInfo) -> bool| -> Vec<String> {
        fields.iter().filter(|f| pick(f)).map(|f| f.name.clone()).collect()
    };
    let searchable_fields = names(|f| f.searchable);
    let required_fields = names(|f| f.required);
    let restrictions: Vec<String> = [
        ("create", crud.create),
        ("read", crud.read),
        ("update", crud.update),
        ("delete", crud.delete),
    ]
    .iter()
    .filter(|(_, on)| *on)
    .map(|(op, _)| op.to_string())
    .collect();

    ObjectProfile {
        object_name: object.into(),
        fields,
        searchable_fields,
        required_fields,
        functions: Vec::new(),
        restrictions,
        supports_crud: crud,
    }
}

fn builtin_profiles() -> Vec<ObjectProfile> {
    let full = CrudSupport {
        create: true,
        read: true,
        update: true,
        delete: true,
    };
    let create_read = CrudSupport {
        create: true,
        read: true,
        update: false,
        delete: false,
    };
    let ttl = FieldInfo {
        field_type: "uint".into(),
        ..field("ttl", false, false)
    };
    let extattrs = FieldInfo {
        field_type: "extattr".into(),
        ..field("extattrs", false, false)
    };

    vec![
        builtin_profile(
            "network",
            vec![
                field("network", true, true),
                field("network_view", false, true),
                field("comment", false, true),
                extattrs.clone(),
            ],
            full,
        ),
        builtin_profile(
            "record:host",
            vec![
                field("name", true, true),
                FieldInfo {
                    field_type: "record:host_ipv4addr".into(),
                    is_array: true,
                    ..field("ipv4addrs", true, false)
                },
                field("view", false, true),
                field("comment", false, true),
                ttl.clone(),
                extattrs.clone(),
            ],
            create_read,
        ),
        builtin_profile(
            "record:a",
            vec![
                field("name", true, true),
                field("ipv4addr", true, true),
                field("view", false, true),
                field("comment", false, true),
                ttl,
                extattrs,
            ],
            create_read,
        ),
    ]
}
