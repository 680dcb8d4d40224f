//! Reusable server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: storage, migrations,
//! services, the REST API, metrics and graceful shutdown.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{
    AccountService, BootstrapAdmin, CurrencyConverter, DirectoryService, InvoiceService,
    LessonService,
};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::{
    init_database, run_migrations, HttpRateProvider, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};
use crate::interfaces::http::middleware::AuthState;
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create the bootstrap super-admin if no account exists (default: true).
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// ```rust,no_run
/// use tutoring_billing::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    /// Port the API is actually bound to.
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// 1. Install the Prometheus recorder
    /// 2. Open storage and run migrations
    /// 3. Create the bootstrap super-admin (if enabled)
    /// 4. Start the REST API (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;
        info!("Starting tutoring billing service...");

        let prometheus = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            match app_cfg.database.backend {
                StorageBackend::Memory => {
                    warn!("Using in-memory storage; data is lost on exit");
                    (Arc::new(InMemoryRepositoryProvider::new()), None)
                }
                StorageBackend::Sqlite => {
                    let db = init_database(&app_cfg.database.to_database_config()).await?;
                    if opts.auto_migrate {
                        run_migrations(&db).await?;
                    }
                    (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
                }
            };

        // ── Services ───────────────────────────────────────────
        let provider = HttpRateProvider::new(
            app_cfg.currency.provider_url.clone(),
            app_cfg.currency.converter_settings().request_timeout,
        )?;
        info!(url = %app_cfg.currency.provider_url, "Exchange-rate provider configured");
        let converter = Arc::new(CurrencyConverter::new(
            Arc::new(provider),
            app_cfg.currency.converter_settings(),
        ));

        let jwt_config = JwtConfig::new(
            app_cfg.security.jwt_secret.clone(),
            app_cfg.security.jwt_expiration_hours,
        );
        info!(
            expiration_hours = jwt_config.expiration_hours,
            "JWT configured"
        );

        let accounts = Arc::new(AccountService::new(
            repos.clone(),
            jwt_config.clone(),
            app_cfg.security.bcrypt_cost,
        ));

        if opts.create_default_admin {
            let admin = BootstrapAdmin {
                username: app_cfg.admin.username.clone(),
                email: app_cfg.admin.email.clone(),
                password: app_cfg.admin.password.clone(),
            };
            match accounts.bootstrap_super_admin(&admin).await {
                Ok(Some(user)) => info!(username = %user.username, "Bootstrap super-admin created"),
                Ok(None) => {}
                Err(e) => error!(error = %e, "Failed to create bootstrap super-admin"),
            }
        }

        let state = ApiState {
            accounts,
            invoices: Arc::new(InvoiceService::new(repos.clone(), converter.clone())),
            lessons: Arc::new(LessonService::new(repos.clone(), converter.clone())),
            directory: Arc::new(DirectoryService::new(repos.clone())),
            converter,
            repos: repos.clone(),
            auth: AuthState { jwt_config },
            metrics: prometheus,
            started_at: Arc::new(Instant::now()),
        };

        // ── REST API server ────────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let api_port = listener.local_addr()?.port();
        info!("REST API listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown.signal();
        let router = create_api_router(state);
        let api_task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API received shutdown signal");
            });
            if let Err(e) = server.await {
                error!(error = %e, "REST API server error");
            }
        });

        Ok(Self {
            repos,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGTERM / SIGINT.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Block until shutdown is triggered, then drain the API and close
    /// storage within the configured timeout.
    pub async fn wait(self) {
        let Self {
            shutdown,
            api_task,
            db,
            ..
        } = self;

        let clean = shutdown
            .shutdown_with_cleanup(|| async move {
                match api_task.await {
                    Ok(()) => info!("REST API stopped"),
                    Err(e) => error!(error = %e, "REST API task panicked"),
                }
                if let Some(db) = db {
                    match db.close().await {
                        Ok(()) => info!("Database connection closed"),
                        Err(e) => warn!(error = %e, "Error closing database connection"),
                    }
                }
            })
            .await;

        if !clean {
            warn!("Exiting with cleanup still pending");
        }
    }

    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can only be installed once per process; later
/// starts (tests, restarts) reuse the first handle.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            match metrics::set_global_recorder(recorder) {
                Ok(()) => info!("Prometheus metrics recorder installed"),
                Err(e) => warn!(error = %e, "Metrics recorder already set; /metrics stays empty"),
            }
            handle
        })
        .clone()
}

/// Initialize tracing from the logging config. Call once at startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.security.bcrypt_cost = 4;
        config
    }

    #[tokio::test]
    async fn starts_bootstraps_and_stops() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_ne!(handle.api_port, 0);
        assert!(handle.is_running());
        assert_eq!(handle.repos.users().count().await.unwrap(), 1);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown finishes");
    }

    #[tokio::test]
    async fn admin_bootstrap_can_be_skipped() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            auto_migrate: false,
            create_default_admin: false,
        })
        .await
        .unwrap();
        assert_eq!(handle.repos.users().count().await.unwrap(), 0);
        handle.shutdown().await;
    }
}
