use std::collections::BTreeMap;

use utoipa::openapi::{schema::Schema, RefOr};

/// Component schemas keyed by their utoipa name.
#[derive(Debug, Default, Clone)]
pub struct ComponentsRegistry {
    pub schemas: BTreeMap<String, RefOr<Schema>>,
}

impl ComponentsRegistry {
    /// Insert unless the key is taken. A different schema under a taken key
    /// is logged and dropped. Returns whether anything was inserted.
    pub fn register_schema(&mut self, name: impl Into<String>, schema: RefOr<Schema>) -> bool {
        let name = name.into();
        match self.schemas.get(&name) {
            None => {
                self.schemas.insert(name, schema);
                true
            }
            Some(existing) => {
                if !same_json(existing, &schema) {
                    tracing::error!(
                        schema_name = %name,
                        "Conflicting schema content under the same component key; keeping the first"
                    );
                }
                false
            }
        }
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }
}

fn same_json(a: &RefOr<Schema>, b: &RefOr<Schema>) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::schema::{ObjectBuilder, Type};

    fn object(prop: &str) -> RefOr<Schema> {
        RefOr::T(Schema::Object(
            ObjectBuilder::new()
                .property(prop, ObjectBuilder::new().schema_type(Type::String))
                .build(),
        ))
    }

    #[test]
    fn first_registration_wins() {
        let mut reg = ComponentsRegistry::default();
        assert!(reg.register_schema("Dto", object("a")));
        assert!(!reg.register_schema("Dto", object("a")));
        assert!(!reg.register_schema("Dto", object("b")));
        assert!(reg.has_schema("Dto"));

        let json = serde_json::to_value(&reg.schemas["Dto"]).unwrap();
        assert!(json["properties"].get("a").is_some());
    }
}
