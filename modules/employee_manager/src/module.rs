use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::EmployeeManagerConfig;
use crate::contract::client::EmployeeManagerApi;
use crate::domain::service::{Repositories, Service};
use crate::gateways::local::EmployeeManagerLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::{
    SeaOrmCompanyRepository, SeaOrmDepartmentRepository, SeaOrmEmployeeRepository,
};
use crate::infra::storage::seeder;

/// Companies, departments and employees over SeaORM, with REST routes and
/// an in-process client in the `ClientHub`.
#[derive(Default)]
pub struct EmployeeManager {
    config: ArcSwap<EmployeeManagerConfig>,
    service: ArcSwapOption<Service>,
}

impl EmployeeManager {
    pub fn config(&self) -> EmployeeManagerConfig {
        (**self.config.load()).clone()
    }

    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.load_full()
    }
}

/// Wire the SeaORM repositories behind the domain ports.
pub fn build_service(conn: sea_orm::DatabaseConnection, cfg: &EmployeeManagerConfig) -> Service {
    let repos = Repositories {
        employees: Arc::new(SeaOrmEmployeeRepository::new(conn.clone())),
        departments: Arc::new(SeaOrmDepartmentRepository::new(conn.clone())),
        companies: Arc::new(SeaOrmCompanyRepository::new(conn)),
    };
    Service::new(repos, cfg)
}

#[async_trait]
impl Module for EmployeeManager {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing employee_manager module");

        let cfg: EmployeeManagerConfig = ctx.module_config_or_default()?;
        debug!(
            "Loaded employee_manager config: default_page_size={}, max_page_size={}, seed={}",
            cfg.default_page_size, cfg.max_page_size, cfg.seed_on_startup
        );

        let db = ctx.db_required()?;
        let service = Arc::new(build_service(db.sea(), &cfg));

        self.config.store(Arc::new(cfg));
        self.service.store(Some(service.clone()));

        let api: Arc<dyn EmployeeManagerApi> = Arc::new(EmployeeManagerLocalClient::new(service));
        ctx.client_hub().register::<dyn EmployeeManagerApi>(api);
        info!("EmployeeManager API exposed to ClientHub");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for EmployeeManager {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running employee_manager database migrations");
        let conn = db.seaorm();
        Migrator::up(conn, None).await?;

        if self.config.load().seed_on_startup {
            seeder::seed(conn).await?;
        }
        info!("employee_manager database ready");
        Ok(())
    }
}

impl RestfulModule for EmployeeManager {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        info!("Registering employee_manager REST routes");

        let service = self
            .service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?;

        let router = routes::register_routes(router, openapi, service)?;
        info!("employee_manager REST routes registered");
        Ok(router)
    }
}
