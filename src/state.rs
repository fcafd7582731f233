mod workspace_pool;

use crate::config::validation::validate_config;
use crate::config::{AppConfig, ConfigError, EngineConfig, RandomSourceKind};
use crate::engine::{FastRandom, Generator, OsRandom};
use crate::error::EngineError;

pub use workspace_pool::PooledWorkspace;
use workspace_pool::WorkspacePool;

/// Failure while assembling [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to initialize generator: {0}")]
    Engine(#[from] EngineError),
}

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub generator: Generator,
    workspaces: WorkspacePool,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, generator: Generator) -> Self {
        let workspaces = WorkspacePool::new(
            config.engine.workspace_bytes,
            config.engine.workspace_pool_size,
        );
        Self {
            config,
            generator,
            workspaces,
        }
    }

    /// Validate `config`, build the generator described by `config.engine`,
    /// then the state.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] when the config breaks a validation
    /// rule, or [`StartupError::Engine`] when the random source cannot produce
    /// a node id.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        validate_config(&config)?;
        let generator = build_generator(&config.engine)?;
        Ok(Self::new(config, generator))
    }

    /// Borrow a request workspace; it goes back to the pool when dropped.
    pub fn acquire_workspace(&self) -> PooledWorkspace<'_> {
        self.workspaces.acquire()
    }

    #[must_use]
    pub fn idle_workspaces(&self) -> usize {
        self.workspaces.idle_count()
    }

    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.config.engine.max_batch_size
    }
}

/// Assemble a [`Generator`] from engine settings.
///
/// # Errors
///
/// Returns [`StartupError`] when the node policy is invalid or the random
/// source cannot produce a node id.
pub fn build_generator(engine: &EngineConfig) -> Result<Generator, StartupError> {
    let builder = Generator::builder().node_policy(engine.node_policy()?);
    let builder = match engine.random_source {
        RandomSourceKind::Os => builder.random_source(OsRandom),
        RandomSourceKind::Fast => builder.random_source(FastRandom),
    };
    Ok(builder.build()?)
}
