use std::collections::BTreeMap;

use modkit::api::{OperationSpec, ParamLocation, ParamSpec, RequestBodySpec, ResponseSpec};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::model::ComponentsRegistry;

#[derive(Serialize)]
pub struct OpenApi {
    pub openapi: &'static str,
    pub info: OpenApiInfo,
    pub paths: BTreeMap<String, BTreeMap<String, Value>>,
    pub components: OpenApiComponents,
}

#[derive(Serialize)]
pub struct OpenApiInfo {
    pub title: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

#[derive(Serialize, Default)]
pub struct OpenApiComponents {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
}

/// Assemble an OpenAPI 3.0 document from registered operations and components.
pub fn build_document<'a>(
    specs: impl IntoIterator<Item = &'a OperationSpec>,
    components: &ComponentsRegistry,
) -> anyhow::Result<OpenApi> {
    let mut paths: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    for spec in specs {
        paths
            .entry(spec.path.clone())
            .or_default()
            .insert(spec.method.as_str().to_lowercase(), operation(spec, components));
    }

    let mut schemas = BTreeMap::new();
    for (name, schema) in &components.schemas {
        schemas.insert(name.clone(), serde_json::to_value(schema)?);
    }

    Ok(OpenApi {
        openapi: "3.0.3",
        info: OpenApiInfo {
            title: "Employee Manager API",
            version: env!("CARGO_PKG_VERSION"),
            description: "Companies, departments and employees",
        },
        paths,
        components: OpenApiComponents { schemas },
    })
}

fn operation(spec: &OperationSpec, components: &ComponentsRegistry) -> Value {
    let mut op = Map::new();
    let op_id = spec.operation_id.clone().unwrap_or_else(|| {
        format!(
            "{}{}",
            spec.method.as_str().to_lowercase(),
            spec.path.replace(['/', '{', '}'], "_")
        )
    });
    op.insert("operationId".into(), Value::String(op_id));
    if let Some(s) = &spec.summary {
        op.insert("summary".into(), Value::String(s.clone()));
    }
    if let Some(d) = &spec.description {
        op.insert("description".into(), Value::String(d.clone()));
    }
    if !spec.tags.is_empty() {
        op.insert("tags".into(), json!(spec.tags));
    }
    if !spec.params.is_empty() {
        let params: Vec<Value> = spec.params.iter().map(parameter).collect();
        op.insert("parameters".into(), Value::Array(params));
    }
    if let Some(body) = &spec.request_body {
        op.insert("requestBody".into(), request_body(body, components));
    }

    let responses: Map<String, Value> = spec
        .responses
        .iter()
        .map(|r| (r.status.to_string(), response(r, components)))
        .collect();
    op.insert("responses".into(), Value::Object(responses));
    Value::Object(op)
}

fn parameter(p: &ParamSpec) -> Value {
    let location = match p.location {
        ParamLocation::Path => "path",
        ParamLocation::Query => "query",
    };
    let mut schema = json!({ "type": p.param_type });
    if let Some(format) = &p.format {
        schema["format"] = Value::String(format.clone());
    }
    let mut v = json!({
        "name": p.name,
        "in": location,
        // path parameters are always required in OpenAPI
        "required": p.location == ParamLocation::Path || p.required,
        "schema": schema,
    });
    if let Some(d) = &p.description {
        v["description"] = Value::String(d.clone());
    }
    v
}

fn request_body(body: &RequestBodySpec, components: &ComponentsRegistry) -> Value {
    let mut v = json!({
        "required": body.required,
        "content": {
            body.content_type: { "schema": schema_ref(components, body.schema_name.as_deref(), false) }
        }
    });
    if let Some(d) = &body.description {
        v["description"] = Value::String(d.clone());
    }
    v
}

fn response(r: &ResponseSpec, components: &ComponentsRegistry) -> Value {
    let mut v = json!({ "description": r.description });
    if let Some(ct) = r.content_type {
        v["content"] = json!({
            ct: { "schema": schema_ref(components, r.schema_name.as_deref(), r.is_array) }
        });
    }
    v
}

/// `$ref` to a known component, else a permissive inline schema.
fn schema_ref(components: &ComponentsRegistry, name: Option<&str>, is_array: bool) -> Value {
    let item = match name {
        Some(n) if components.has_schema(n) => {
            json!({ "$ref": format!("#/components/schemas/{n}") })
        }
        _ => json!({}),
    };
    if is_array {
        json!({ "type": "array", "items": item })
    } else {
        item
    }
}
