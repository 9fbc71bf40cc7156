use std::sync::Arc;

use log::Logger;

use crate::identity::IdentityConfig;
use crate::repository::Repository;

/// Everything a route handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub repository: Arc<Repository>,
    pub identity: Arc<IdentityConfig>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        repository: Arc<Repository>,
        identity: Arc<IdentityConfig>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            repository,
            identity,
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// The path segment all API routes live under.
    pub(crate) api_path: String,
}

impl Config {
    pub fn new(api_path: impl Into<String>) -> Self {
        Self {
            api_path: api_path.into(),
        }
    }
}
