//! Engine runtime bootstrap.
//!
//! Provides [`EngineHandle`]: database init, migrations, catalog seeding,
//! event bus and the application services, wired once so the CLI and any
//! embedding host share the same startup path.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::application::{CheckoutService, LifecycleService};
use crate::config::AppConfig;
use crate::domain::{Actor, DomainResult, RepositoryProvider, StaticAuthContext};
use crate::infrastructure::database::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::notifications::{create_event_bus, SharedEventBus};
use crate::shared::{AppError, InfraError};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the booking engine.
pub struct EngineOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Upsert `[[catalog]]` rows from the configuration (default: true).
    pub seed_catalog: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            seed_catalog: true,
        }
    }
}

// ── EngineHandle ───────────────────────────────────────────────────

/// Handle to a started engine.
///
/// ```rust,no_run
/// use booking_engine::runtime::{EngineHandle, EngineOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let engine = EngineHandle::start(EngineOptions::default()).await?;
///     let actor = engine.actor_for("alice")?;
///     let mine = engine.lifecycle.list_reservations(&actor, Default::default()).await?;
///     println!("{} reservations", mine.len());
///     engine.close().await;
///     Ok(())
/// }
/// ```
pub struct EngineHandle {
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    /// Shared event bus for reservation notifications.
    pub event_bus: SharedEventBus,
    pub checkout: CheckoutService,
    pub lifecycle: LifecycleService,
    /// The configuration the engine was started with.
    pub config: AppConfig,

    db: DatabaseConnection,
}

impl EngineHandle {
    /// Start the engine.
    ///
    /// This will:
    /// 1. Connect to the database and run migrations
    /// 2. Seed the catalog from configuration
    /// 3. Build the event bus and the checkout / lifecycle services
    pub async fn start(opts: EngineOptions) -> Result<Self, AppError> {
        let config = opts.config;
        config.check()?;

        info!("Starting booking engine...");

        // ── Database ───────────────────────────────────────────
        let db = init_database(&config.database_config())
            .await
            .map_err(InfraError::from)?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            run_migrations(&db).await.map_err(InfraError::from)?;
        }

        let provider = SeaOrmRepositoryProvider::new(db.clone(), config.booking.enforce_overlap);
        if !config.booking.enforce_overlap {
            warn!("Overlap check disabled, double bookings will be accepted");
        }

        if opts.seed_catalog && !config.catalog.is_empty() {
            for service in config.catalog_services() {
                provider.services().upsert(service).await?;
            }
            info!(count = config.catalog.len(), "Catalog seeded from configuration");
        }

        // ── Services ───────────────────────────────────────────
        let repos: Arc<dyn RepositoryProvider> = Arc::new(provider);
        let event_bus = create_event_bus();
        let builder = config.reservation_builder()?;

        let checkout =
            CheckoutService::new(repos.clone(), builder).with_event_bus(event_bus.clone());
        let lifecycle =
            LifecycleService::new(repos.clone(), builder).with_event_bus(event_bus.clone());

        info!("Booking engine ready");

        Ok(Self {
            repos,
            event_bus,
            checkout,
            lifecycle,
            config,
            db,
        })
    }

    /// Authentication context for `customer_id`; role comes from `[auth] admins`
    pub fn auth_context(&self, customer_id: &str) -> StaticAuthContext {
        StaticAuthContext::from_roster(customer_id, &self.config.auth.admin_ids())
    }

    pub fn actor_for(&self, customer_id: &str) -> DomainResult<Actor> {
        Actor::from_context(&self.auth_context(customer_id))
    }

    /// Close the database connection.
    pub async fn close(self) {
        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`EngineHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
