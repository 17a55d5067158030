use axum::Router;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::contracts::{
    DbModule, Module, OpenApiRegistry, RestHostModule, RestfulModule, StatefulModule,
};

pub struct ModuleEntry {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub core: Arc<dyn Module>,
    pub db: Option<Arc<dyn DbModule>>,
    pub rest: Option<Arc<dyn RestfulModule>>,
    pub rest_host: Option<Arc<dyn RestHostModule>>,
    pub stateful: Option<Arc<dyn StatefulModule>>,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("has_db", &self.db.is_some())
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// Handle returned by [`RegistryBuilder::add`] to attach optional capabilities.
pub struct ModuleSlot<'a> {
    entry: Option<&'a mut ModuleEntry>,
}

impl ModuleSlot<'_> {
    pub fn with_db(self, m: Arc<dyn DbModule>) -> Self {
        self.map(|e| e.db = Some(m))
    }

    pub fn with_rest(self, m: Arc<dyn RestfulModule>) -> Self {
        self.map(|e| e.rest = Some(m))
    }

    pub fn with_rest_host(self, m: Arc<dyn RestHostModule>) -> Self {
        self.map(|e| e.rest_host = Some(m))
    }

    pub fn with_stateful(self, m: Arc<dyn StatefulModule>) -> Self {
        self.map(|e| e.stateful = Some(m))
    }

    fn map(mut self, f: impl FnOnce(&mut ModuleEntry)) -> Self {
        if let Some(e) = self.entry.as_deref_mut() {
            f(e);
        }
        self
    }
}

/// Collects module entries; [`build_topo_sorted`](Self::build_topo_sorted) validates them.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<ModuleEntry>,
    errors: Vec<String>,
}

impl RegistryBuilder {
    pub fn add(
        &mut self,
        name: &'static str,
        deps: &'static [&'static str],
        core: Arc<dyn Module>,
    ) -> ModuleSlot<'_> {
        if self.entries.iter().any(|e| e.name == name) {
            self.errors
                .push(format!("Module '{name}' is already registered"));
            return ModuleSlot { entry: None };
        }
        self.entries.push(ModuleEntry {
            name,
            deps,
            core,
            db: None,
            rest: None,
            rest_host: None,
            stateful: None,
        });
        ModuleSlot {
            entry: self.entries.last_mut(),
        }
    }

    /// Validate and order modules so every dependency comes before its dependents.
    ///
    /// Ties are broken by module name, so the order is stable across runs.
    pub fn build_topo_sorted(self) -> Result<ModuleRegistry, RegistryError> {
        let hosts: Vec<&str> = self
            .entries
            .iter()
            .filter(|e| e.rest_host.is_some())
            .map(|e| e.name)
            .collect();
        let mut errors = self.errors;
        if hosts.len() > 1 {
            errors.push(format!(
                "Multiple REST host modules detected: {}. Only one REST host is allowed.",
                hosts.join(", ")
            ));
        }
        if !errors.is_empty() {
            return Err(RegistryError::InvalidRegistryConfiguration { errors });
        }

        let known: BTreeSet<&'static str> = self.entries.iter().map(|e| e.name).collect();
        let mut indeg: BTreeMap<&'static str, usize> = known.iter().map(|&n| (n, 0)).collect();
        let mut dependents: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();

        for e in &self.entries {
            for &d in e.deps {
                if !known.contains(d) {
                    return Err(RegistryError::UnknownDependency {
                        module: e.name.to_string(),
                        depends_on: d.to_string(),
                    });
                }
                dependents.entry(d).or_default().push(e.name);
                *indeg.entry(e.name).or_default() += 1;
            }
        }

        let mut ready: VecDeque<&'static str> = indeg
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(&n, _)| n)
            .collect();
        let mut order = Vec::with_capacity(known.len());

        while let Some(n) = ready.pop_front() {
            order.push(n);
            let mut unlocked = Vec::new();
            for &m in dependents.get(n).map(Vec::as_slice).unwrap_or_default() {
                if let Some(d) = indeg.get_mut(m) {
                    *d -= 1;
                    if *d == 0 {
                        unlocked.push(m);
                    }
                }
            }
            unlocked.sort_unstable();
            ready.extend(unlocked);
        }

        if order.len() != known.len() {
            let remaining = indeg
                .into_iter()
                .filter(|(_, d)| *d > 0)
                .map(|(n, _)| n)
                .collect();
            return Err(RegistryError::CycleDetected { remaining });
        }

        let mut entries = self.entries;
        entries.sort_by_key(|e| order.iter().position(|&n| n == e.name));
        Ok(ModuleRegistry { modules: entries })
    }
}

/// Topo-sorted modules, driven phase by phase by the runner.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name).collect()
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.core.clone())
    }

    pub async fn run_init_phase(&self, base_ctx: &ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &modkit_db::DbHandle) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                tracing::debug!(module = e.name, "Running migrations");
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Host prepare, then every REST provider in order, then host finalize.
    pub fn run_rest_phase(
        &self,
        base_ctx: &ModuleCtx,
        router: Router,
    ) -> Result<Router, RegistryError> {
        let Some((host_name, host)) = self
            .modules
            .iter()
            .find_map(|e| e.rest_host.as_ref().map(|h| (e.name, h)))
        else {
            return if self.modules.iter().any(|e| e.rest.is_some()) {
                Err(RegistryError::RestRequiresHost)
            } else {
                Ok(router)
            };
        };

        let host_ctx = base_ctx.clone().for_module(host_name);
        let openapi: &dyn OpenApiRegistry = host.as_registry();

        let mut router = host
            .rest_prepare(&host_ctx, router)
            .map_err(|source| RegistryError::RestPrepare {
                module: host_name,
                source,
            })?;

        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, openapi)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        host.rest_finalize(&host_ctx, router)
            .map_err(|source| RegistryError::RestFinalize {
                module: host_name,
                source,
            })
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Reverse order; failures are logged and do not stop the remaining modules.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "Failed to stop module");
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown dependency '{depends_on}' of module '{module}'")]
    UnknownDependency { module: String, depends_on: String },
    #[error("cyclic dependency detected among modules: {remaining:?}")]
    CycleDetected { remaining: Vec<&'static str> },
    #[error("invalid registry configuration:\n{errors:#?}")]
    InvalidRegistryConfiguration { errors: Vec<String> },
    #[error("REST phase requires a REST host module")]
    RestRequiresHost,

    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("database migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for module '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{OperationSpec, OpenApiRegistry};
    use crate::context::ModuleCtxBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        inits: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Module for Probe {
        async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Module for Failing {
        async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct Host;

    impl OpenApiRegistry for Host {
        fn register_operation(&self, _spec: &OperationSpec) {}
        fn ensure_schema_raw(
            &self,
            name: &str,
            _schemas: Vec<(String, utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>)>,
        ) -> String {
            name.to_string()
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl RestHostModule for Host {
        fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            Ok(router)
        }
        fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            Ok(router)
        }
        fn as_registry(&self) -> &dyn OpenApiRegistry {
            self
        }
    }

    struct Routes;

    impl RestfulModule for Routes {
        fn register_rest(
            &self,
            _ctx: &ModuleCtx,
            router: Router,
            _openapi: &dyn OpenApiRegistry,
        ) -> anyhow::Result<Router> {
            Ok(router)
        }
    }

    fn probe() -> Arc<dyn Module> {
        Arc::new(Probe::default())
    }

    fn ctx() -> ModuleCtx {
        ModuleCtxBuilder::new(CancellationToken::new()).build()
    }

    #[test]
    fn dependencies_come_first() {
        let mut b = RegistryBuilder::default();
        b.add("service", &["ingress", "storage"], probe());
        b.add("storage", &[], probe());
        b.add("ingress", &[], probe());

        let reg = b.build_topo_sorted().unwrap();
        assert_eq!(reg.names(), vec!["ingress", "storage", "service"]);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut b = RegistryBuilder::default();
        b.add("a", &[], probe());
        b.add("a", &[], probe());
        assert!(matches!(
            b.build_topo_sorted(),
            Err(RegistryError::InvalidRegistryConfiguration { .. })
        ));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut b = RegistryBuilder::default();
        b.add("a", &["missing"], probe());
        let err = b.build_topo_sorted().unwrap_err();
        match err {
            RegistryError::UnknownDependency { module, depends_on } => {
                assert_eq!(module, "a");
                assert_eq!(depends_on, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cycle_is_reported() {
        let mut b = RegistryBuilder::default();
        b.add("a", &["b"], probe());
        b.add("b", &["a"], probe());
        b.add("c", &[], probe());
        match b.build_topo_sorted().unwrap_err() {
            RegistryError::CycleDetected { remaining } => assert_eq!(remaining, vec!["a", "b"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn two_rest_hosts_are_rejected() {
        let mut b = RegistryBuilder::default();
        b.add("h1", &[], probe()).with_rest_host(Arc::new(Host));
        b.add("h2", &[], probe()).with_rest_host(Arc::new(Host));
        assert!(matches!(
            b.build_topo_sorted(),
            Err(RegistryError::InvalidRegistryConfiguration { .. })
        ));
    }

    #[test]
    fn rest_without_host_fails() {
        let mut b = RegistryBuilder::default();
        b.add("svc", &[], probe()).with_rest(Arc::new(Routes));
        let reg = b.build_topo_sorted().unwrap();
        assert!(matches!(
            reg.run_rest_phase(&ctx(), Router::new()),
            Err(RegistryError::RestRequiresHost)
        ));
    }

    #[test]
    fn rest_phase_with_host_succeeds() {
        let mut b = RegistryBuilder::default();
        b.add("host", &[], probe()).with_rest_host(Arc::new(Host));
        b.add("svc", &["host"], probe()).with_rest(Arc::new(Routes));
        let reg = b.build_topo_sorted().unwrap();
        assert!(reg.run_rest_phase(&ctx(), Router::new()).is_ok());
    }

    #[tokio::test]
    async fn init_runs_every_module_and_reports_failures() {
        let p = Arc::new(Probe::default());
        let mut b = RegistryBuilder::default();
        b.add("a", &[], p.clone());
        b.add("b", &["a"], Arc::new(Failing));
        let reg = b.build_topo_sorted().unwrap();

        let err = reg.run_init_phase(&ctx()).await.unwrap_err();
        assert!(matches!(err, RegistryError::Init { module: "b", .. }));
        assert_eq!(p.inits.load(Ordering::SeqCst), 1);
    }
}
