//! Type-keyed registry of in-process clients.
//!
//! Providers register an `Arc<dyn Trait>` once; consumers look it up by the same
//! trait object type. Entries live in an optional named scope, `global` by default.
//! Re-registering replaces the entry; Arcs already handed out stay valid.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, sync::Arc};

pub const GLOBAL_SCOPE: &str = "global";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Key {
    type_name: &'static str,
    scope: Arc<str>,
}

impl Key {
    fn of<T: ?Sized + 'static>(scope: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            scope: scope.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientHubError {
    #[error("client not found: type={type_name}, scope={scope}")]
    NotFound { type_name: &'static str, scope: String },

    #[error("type mismatch in hub for type={type_name}, scope={scope}")]
    TypeMismatch { type_name: &'static str, scope: String },
}

type Boxed = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ClientHub {
    map: RwLock<HashMap<Key, Boxed>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&self, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_scoped::<T>(GLOBAL_SCOPE, client);
    }

    pub fn register_scoped<T>(&self, scope: impl Into<Arc<str>>, client: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.write().insert(Key::of::<T>(scope), Box::new(client));
    }

    pub fn get<T>(&self) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_scoped::<T>(GLOBAL_SCOPE)
    }

    pub fn get_scoped<T>(&self, scope: impl Into<Arc<str>>) -> Result<Arc<T>, ClientHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<T>(scope);
        let map = self.map.read();
        let boxed = map.get(&key).ok_or_else(|| ClientHubError::NotFound {
            type_name: key.type_name,
            scope: key.scope.to_string(),
        })?;
        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ClientHubError::TypeMismatch {
                type_name: key.type_name,
                scope: key.scope.to_string(),
            })
    }

    pub fn remove<T>(&self, scope: impl Into<Arc<str>>) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let boxed = self.map.write().remove(&Key::of::<T>(scope))?;
        boxed.downcast::<Arc<T>>().ok().map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_trait::async_trait]
    trait Directory: Send + Sync {
        async fn headcount(&self) -> usize;
    }

    struct Fixed(usize);

    #[async_trait::async_trait]
    impl Directory for Fixed {
        async fn headcount(&self) -> usize {
            self.0
        }
    }

    #[tokio::test]
    async fn register_and_get_trait_object() {
        let hub = ClientHub::new();
        let api: Arc<dyn Directory> = Arc::new(Fixed(10));
        hub.register::<dyn Directory>(api.clone());

        let got = hub.get::<dyn Directory>().unwrap();
        assert_eq!(got.headcount().await, 10);
        assert!(Arc::ptr_eq(&api, &got));
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let hub = ClientHub::new();
        hub.register_scoped::<dyn Directory>("east", Arc::new(Fixed(1)));
        hub.register_scoped::<dyn Directory>("west", Arc::new(Fixed(2)));

        assert_eq!(hub.get_scoped::<dyn Directory>("east").unwrap().headcount().await, 1);
        assert_eq!(hub.get_scoped::<dyn Directory>("west").unwrap().headcount().await, 2);
        assert!(matches!(
            hub.get::<dyn Directory>(),
            Err(ClientHubError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_returns_previous_entry() {
        let hub = ClientHub::new();
        hub.register::<dyn Directory>(Arc::new(Fixed(3)));
        assert_eq!(hub.len(), 1);
        assert!(hub.remove::<dyn Directory>(GLOBAL_SCOPE).is_some());
        assert!(hub.is_empty());
    }
}
