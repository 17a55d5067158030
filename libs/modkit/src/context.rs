use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::client_hub::ClientHub;
use modkit_db::DbHandle;

/// Source of raw per-module configuration sections.
pub trait ConfigProvider: Send + Sync {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// Everything a module may touch during its lifecycle phases.
#[derive(Clone)]
pub struct ModuleCtx {
    db: Option<Arc<DbHandle>>,
    config_provider: Option<Arc<dyn ConfigProvider>>,
    client_hub: Arc<ClientHub>,
    cancellation_token: CancellationToken,
    module_name: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: ModuleCtx {
                db: None,
                config_provider: None,
                client_hub: Arc::new(ClientHub::default()),
                cancellation_token: token,
                module_name: None,
            },
        }
    }

    pub fn with_db(mut self, db: Arc<DbHandle>) -> Self {
        self.inner.db = Some(db);
        self
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    pub fn with_client_hub(mut self, hub: Arc<ClientHub>) -> Self {
        self.inner.client_hub = hub;
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    /// Same context, scoped to `name` for config lookups.
    pub fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn db(&self) -> Option<Arc<DbHandle>> {
        self.db.clone()
    }

    pub fn db_required(&self) -> anyhow::Result<Arc<DbHandle>> {
        self.db.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "module '{}' requires a database but none is configured",
                self.current_module().unwrap_or("<unscoped>")
            )
        })
    }

    pub fn client_hub(&self) -> Arc<ClientHub> {
        self.client_hub.clone()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    fn raw_config(&self) -> Option<&serde_json::Value> {
        let name = self.module_name.as_deref()?;
        self.config_provider.as_ref()?.get_module_config(name)
    }

    /// The module's section deserialized into `T`; `T::default()` when absent.
    ///
    /// A present but malformed section is an error.
    pub fn module_config_or_default<T: DeserializeOwned + Default>(&self) -> anyhow::Result<T> {
        match self.raw_config() {
            None => Ok(T::default()),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                anyhow::anyhow!(
                    "invalid {} config: {e}",
                    self.current_module().unwrap_or("<unscoped>")
                )
            }),
        }
    }

    /// Strict variant: the section must exist.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .current_module()
            .ok_or_else(|| anyhow::anyhow!("context is not scoped to a module"))?;
        let val = self
            .raw_config()
            .ok_or_else(|| anyhow::anyhow!("missing module config: {name}"))?;
        serde_json::from_value(val.clone()).map_err(|e| anyhow::anyhow!("invalid {name} config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    struct MapProvider(HashMap<String, serde_json::Value>);

    impl ConfigProvider for MapProvider {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            self.0.get(module_name)
        }
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Cfg {
        #[serde(default)]
        size: u32,
    }

    fn ctx_with(values: &[(&str, serde_json::Value)]) -> ModuleCtx {
        let map = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ModuleCtxBuilder::new(CancellationToken::new())
            .with_config_provider(Arc::new(MapProvider(map)))
            .build()
    }

    #[test]
    fn missing_section_uses_default() {
        let ctx = ctx_with(&[]).for_module("m");
        assert_eq!(ctx.module_config_or_default::<Cfg>().unwrap(), Cfg::default());
        assert!(ctx.module_config_required::<Cfg>().is_err());
    }

    #[test]
    fn present_section_is_parsed() {
        let ctx = ctx_with(&[("m", serde_json::json!({ "size": 7 }))]).for_module("m");
        assert_eq!(ctx.module_config_or_default::<Cfg>().unwrap().size, 7);
        assert_eq!(ctx.module_config_required::<Cfg>().unwrap().size, 7);
    }

    #[test]
    fn malformed_section_is_an_error() {
        let ctx = ctx_with(&[("m", serde_json::json!({ "bogus": 1 }))]).for_module("m");
        let err = ctx.module_config_or_default::<Cfg>().unwrap_err();
        assert!(err.to_string().contains("invalid m config"));
    }

    #[test]
    fn db_required_without_db_fails() {
        let ctx = ctx_with(&[]).for_module("m");
        assert!(ctx.db().is_none());
        assert!(ctx.db_required().is_err());
    }
}
