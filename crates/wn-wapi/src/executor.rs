//! API executor: operation descriptor + entity set → one WAPI call.
//!
//! Mutations that address an existing object (update, delete, function
//! calls) resolve the object's `_ref` with a lookup GET first. An empty
//! lookup stops before any mutating request is sent.

use serde_json::{Map, Value, json};
use wn_protocol::{EntitySet, HttpMethod, OperationDescriptor, OperationKind};

use crate::client::WapiClient;
use crate::error::{WapiError, WapiResult};

/// Fields that describe an object rather than identify it; never used to
/// locate the target of an update.
const DESCRIPTIVE_FIELDS: &[&str] = &["comment", "extattrs", "ttl", "use_ttl", "disable"];

/// Fields that name an object, preferred over any other searchable field
/// when locating it.
const PRIMARY_FIELDS: &[&str] = &["name", "network", "fqdn"];

/// Dispatches descriptors against a borrowed client.
pub struct ApiExecutor<'a> {
    client: &'a WapiClient,
    max_results: u32,
}

impl<'a> ApiExecutor<'a> {
    pub fn new(client: &'a WapiClient, max_results: u32) -> Self {
        Self {
            client,
            max_results,
        }
    }

    /// Run the operation. Every failure becomes `{"error": <message>}`.
    pub async fn execute(&self, descriptor: &OperationDescriptor, entities: &EntitySet) -> Value {
        match self.try_execute(descriptor, entities).await {
            Ok(value) => {
                tracing::info!(tool = %descriptor.name, method = %descriptor.method, "WAPI call succeeded");
                value
            }
            Err(e) => {
                tracing::warn!(tool = %descriptor.name, error = %e, "WAPI call failed");
                json!({ "error": e.to_string() })
            }
        }
    }

    pub async fn try_execute(
        &self,
        descriptor: &OperationDescriptor,
        entities: &EntitySet,
    ) -> WapiResult<Value> {
        let missing: Vec<String> = descriptor
            .required_fields
            .iter()
            .filter(|f| field_value(f, entities).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(WapiError::MissingFields(missing));
        }

        match descriptor.kind {
            OperationKind::Find => {
                let mut query: Vec<(String, String)> = descriptor
                    .searchable_fields
                    .iter()
                    .filter_map(|f| Some((f.clone(), query_value(&field_value(f, entities)?)?)))
                    .collect();
                query.push(("_max_results".into(), self.max_results.to_string()));
                self.client.get(&descriptor.endpoint, &query).await
            }
            OperationKind::Create => {
                let body = build_body(&descriptor.fields, entities, &[]);
                self.client.post(&descriptor.endpoint, &body).await
            }
            OperationKind::Update | OperationKind::Delete | OperationKind::Function => {
                let (reference, lookup_keys) = self.resolve_reference(descriptor, entities).await?;
                let path = descriptor.endpoint.replace("{ref}", &reference);
                match descriptor.method {
                    HttpMethod::Put => {
                        let body = build_body(&descriptor.fields, entities, &lookup_keys);
                        self.client.put(&path, &body).await
                    }
                    HttpMethod::Delete => self.client.delete(&path).await,
                    HttpMethod::Post => {
                        let body = build_body(&descriptor.fields, entities, &lookup_keys);
                        self.client.post(&path, &body).await
                    }
                    HttpMethod::Get => self.client.get(&path, &[]).await,
                }
            }
        }
    }

    /// Find the target object's `_ref` by a single identifying field.
    /// Returns it with that field's name, so it can be left out of an update
    /// body while every other field is sent as the new value.
    async fn resolve_reference(
        &self,
        descriptor: &OperationDescriptor,
        entities: &EntitySet,
    ) -> WapiResult<(String, Vec<String>)> {
        if let Some(reference) = entities.get_str("_ref") {
            return Ok((reference, Vec::new()));
        }

        let key = lookup_key(descriptor, entities).ok_or(WapiError::NoLookupCriteria)?;
        let query = vec![key];

        let found = self
            .client
            .get(&format!("/{}", descriptor.object), &query)
            .await?;
        let reference = found
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item.get("_ref"))
            .and_then(Value::as_str)
            .ok_or(WapiError::ReferenceNotFound)?;

        tracing::debug!(object = %descriptor.object, reference, "resolved object reference");
        Ok((
            reference.to_string(),
            query.into_iter().map(|(k, _)| k).collect(),
        ))
    }
}

/// The primary identifying field with a value, else the first other
/// non-descriptive searchable field that has one.
fn lookup_key(descriptor: &OperationDescriptor, entities: &EntitySet) -> Option<(String, String)> {
    let candidate =
        |field: &String| Some((field.clone(), query_value(&field_value(field, entities)?)?));
    let searchable = &descriptor.searchable_fields;

    PRIMARY_FIELDS
        .iter()
        .filter_map(|p| searchable.iter().find(|f| f.as_str() == *p))
        .find_map(candidate)
        .or_else(|| {
            searchable
                .iter()
                .filter(|f| !DESCRIPTIVE_FIELDS.contains(&f.as_str()))
                .find_map(candidate)
        })
}

/// Value for a WAPI field, taken from the entity of the same name or from
/// the entity it is conventionally derived from.
pub fn field_value(field: &str, entities: &EntitySet) -> Option<Value> {
    let value = match entities.get(field) {
        Some(v) => Some(v.clone()),
        None => match field {
            "network" => entities.get("cidr").cloned(),
            "ipv4addr" | "contains_address" => entities.get("ip").cloned(),
            "ipv4addrs" => entities.get("ip").map(|ip| json!([{ "ipv4addr": ip }])),
            "name" | "ptrdname" => entities.get("fqdn").cloned(),
            _ => None,
        },
    }?;

    match (field, value) {
        (_, Value::Null) => None,
        (_, Value::String(s)) if s.trim().is_empty() => None,
        ("ttl", Value::String(s)) => Some(s.parse::<u64>().map(Value::from).unwrap_or(Value::String(s))),
        (_, v) => Some(v),
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn build_body(fields: &[String], entities: &EntitySet, exclude: &[String]) -> Value {
    let body: Map<String, Value> = fields
        .iter()
        .filter(|f| !exclude.contains(*f))
        .filter_map(|f| Some((f.clone(), field_value(f, entities)?)))
        .collect();
    Value::Object(body)
}
