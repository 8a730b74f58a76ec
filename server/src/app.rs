//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::api::auth::{IdentityService, identity_from_config};
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::{AppConfig, TierMode};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::ResponseCache;
use crate::data::cold::{ColdReader, TimestreamColdStore};
use crate::data::hot::{DynamoHotStore, HotReader};
use crate::domain::QueryRouter;
use crate::domain::telemetry::RouterSettings;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub router: Arc<QueryRouter>,
    pub identity: Arc<dyn IdentityService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Config) => return Self::print_config(&cli_config),
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let shutdown = ShutdownService::new();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.aws.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;
        let timeout = config.query.backend_timeout();

        let hot = match config.query.tier_mode {
            TierMode::Auto => {
                let store = DynamoHotStore::new(
                    &sdk_config,
                    config.aws.endpoint.as_deref(),
                    config.hot.table.clone(),
                );
                Some(HotReader::new(Arc::new(store), timeout))
            }
            TierMode::Cold => {
                tracing::debug!("Cold-only mode, hot tier not initialized");
                None
            }
        };

        let (cold_store, reload) = TimestreamColdStore::connect(&sdk_config, shutdown.subscribe())
            .await
            .context("Failed to initialize cold tier")?;
        shutdown.register(reload).await;
        let cold = ColdReader::new(Arc::new(cold_store), timeout);

        let router = Arc::new(QueryRouter::new(
            hot,
            cold,
            RouterSettings::from_config(&config),
            ResponseCache::from_config(&config.cache),
        ));
        let identity = identity_from_config(&config.auth)?;

        tracing::debug!(
            tier_mode = %config.query.tier_mode,
            cache_limit = config.cache.limit,
            cache_expiration_secs = config.cache.expiration_secs,
            "Query engine initialized"
        );

        Ok(Self {
            shutdown,
            config,
            router,
            identity,
        })
    }

    fn print_config(cli: &CliConfig) -> Result<()> {
        let config = AppConfig::load(cli)?;
        println!("{:#?}", config);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers before binding
        app.shutdown.install_signal_handlers();

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
