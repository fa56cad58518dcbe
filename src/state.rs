use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use scanlearn_auth::{
    AccessGate, GateSettings, JwtSessionProvider, PolicyTable, SessionProvider, UserDirectory,
};
use scanlearn_config::{GateConfig, JwtConfig};
use scanlearn_db::{PgUserDirectory, init_db_pool};

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(gate: AccessGate) -> Self {
        Self { gate }
    }

    /// Builds a state around the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate configuration names an invalid or empty
    /// set of mutating methods.
    pub fn with_collaborators(
        policy: PolicyTable,
        sessions: Arc<dyn SessionProvider>,
        directory: Arc<dyn UserDirectory>,
        gate_config: &GateConfig,
    ) -> anyhow::Result<Self> {
        let settings =
            GateSettings::from_config(gate_config).context("invalid GATE_MUTATING_METHODS")?;

        Ok(Self::new(AccessGate::new(
            Arc::new(policy),
            sessions,
            directory,
            settings,
        )))
    }
}

/// Loads the policy table named by `ACCESS_POLICY_PATH`, or the built-in one.
pub fn load_policy(gate_config: &GateConfig) -> anyhow::Result<PolicyTable> {
    match &gate_config.policy_path {
        Some(path) => {
            let table = PolicyTable::from_json_file(path)
                .with_context(|| format!("loading access policy from {}", path.display()))?;
            info!(path = %path.display(), rules = table.rules().len(), "Loaded access policy file");
            Ok(table)
        }
        None => Ok(PolicyTable::builtin()),
    }
}

pub fn init_app_state() -> anyhow::Result<AppState> {
    let jwt_config = JwtConfig::from_env();
    let gate_config = GateConfig::from_env();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url).context("invalid DATABASE_URL")?;

    AppState::with_collaborators(
        load_policy(&gate_config)?,
        Arc::new(JwtSessionProvider::new(jwt_config)),
        Arc::new(PgUserDirectory::new(pool)),
        &gate_config,
    )
}
