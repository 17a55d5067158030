//! Lifecycle runner: init → db → rest → start → wait → stop.
//!
//! One `ModuleCtx` is built up front and shared by every phase. Shutdown is
//! driven by OS signals, an external `CancellationToken`, or any future.

use crate::client_hub::ClientHub;
use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

pub enum DbOptions {
    /// `ModuleCtx::db()` is `None` and the db phase is skipped.
    None,
    /// Shared handle; modules with a `DbModule` capability migrate against it.
    Existing(Arc<modkit_db::DbHandle>),
}

pub enum ShutdownOptions {
    /// Ctrl+C / SIGTERM.
    Signals,
    /// The caller cancels the token.
    Token(CancellationToken),
    /// Shutdown begins when the future completes.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    pub registry: ModuleRegistry,
    /// Raw module config sections by module name.
    pub modules_cfg: Arc<dyn ConfigProvider>,
    pub db: DbOptions,
    pub shutdown: ShutdownOptions,
}

pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        registry,
        modules_cfg,
        db,
        shutdown,
    } = opts;

    let cancel = match &shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };
    spawn_shutdown_waiter(shutdown, cancel.clone());

    let mut ctx_builder = ModuleCtxBuilder::new(cancel.clone())
        .with_client_hub(Arc::new(ClientHub::default()))
        .with_config_provider(modules_cfg);
    if let DbOptions::Existing(handle) = &db {
        ctx_builder = ctx_builder.with_db(handle.clone());
    }
    let base_ctx = ctx_builder.build();

    tracing::info!(modules = ?registry.names(), "Phase: init");
    registry.run_init_phase(&base_ctx).await?;

    if let DbOptions::Existing(handle) = &db {
        tracing::info!("Phase: db");
        registry.run_db_phase(handle).await?;
    }

    tracing::info!("Phase: rest");
    registry.run_rest_phase(&base_ctx, axum::Router::new())?;

    tracing::info!("Phase: start");
    registry.run_start_phase(cancel.clone()).await?;

    cancel.cancelled().await;

    tracing::info!("Phase: stop");
    registry.run_stop_phase(cancel).await;

    if let DbOptions::Existing(handle) = db {
        handle.close().await;
    }
    Ok(())
}

fn spawn_shutdown_waiter(shutdown: ShutdownOptions, cancel: CancellationToken) {
    match shutdown {
        ShutdownOptions::Signals => {
            tokio::spawn(async move {
                if let Err(e) = shutdown::wait_for_shutdown().await {
                    tracing::warn!(error = %e, "signal listener failed; falling back to ctrl_c");
                    let _ = tokio::signal::ctrl_c().await;
                }
                tracing::info!("shutdown: signal received");
                cancel.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                cancel.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::debug!("shutdown: lifecycle controlled by external token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleCtx;
    use crate::contracts::{Module, StatefulModule};
    use crate::registry::RegistryBuilder;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct NoConfig;

    impl ConfigProvider for NoConfig {
        fn get_module_config(&self, _module_name: &str) -> Option<&serde_json::Value> {
            None
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl Module for Recorder {
        async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
            self.events.lock().push("init");
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[async_trait::async_trait]
    impl StatefulModule for Recorder {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.events.lock().push("start");
            Ok(())
        }
        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.events.lock().push("stop");
            Ok(())
        }
    }

    fn registry_with(rec: Arc<Recorder>) -> ModuleRegistry {
        let mut b = RegistryBuilder::default();
        b.add("recorder", &[], rec.clone()).with_stateful(rec);
        b.build_topo_sorted().unwrap()
    }

    #[tokio::test]
    async fn token_shutdown_runs_all_phases() -> anyhow::Result<()> {
        let rec = Arc::new(Recorder::default());
        let token = CancellationToken::new();
        let stopper = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            stopper.cancel();
        });

        run(RunOptions {
            registry: registry_with(rec.clone()),
            modules_cfg: Arc::new(NoConfig),
            db: DbOptions::None,
            shutdown: ShutdownOptions::Token(token),
        })
        .await?;

        assert_eq!(*rec.events.lock(), vec!["init", "start", "stop"]);
        Ok(())
    }

    #[tokio::test]
    async fn future_shutdown_with_db() -> anyhow::Result<()> {
        let rec = Arc::new(Recorder::default());
        let db = modkit_db::DbHandle::connect("sqlite::memory:", Default::default()).await?;

        run(RunOptions {
            registry: registry_with(rec.clone()),
            modules_cfg: Arc::new(NoConfig),
            db: DbOptions::Existing(Arc::new(db)),
            shutdown: ShutdownOptions::Future(Box::pin(async {})),
        })
        .await?;

        let counts = rec.events.lock().iter().fold(HashMap::new(), |mut m, e| {
            *m.entry(*e).or_insert(0) += 1;
            m
        });
        assert_eq!(counts.get("stop"), Some(&1));
        Ok(())
    }
}
