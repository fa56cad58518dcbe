use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Access gate configuration.
///
/// # Environment Variables
///
/// - `GATE_MUTATING_METHODS`: comma separated methods subject to the teacher check (default: `POST`)
/// - `GATE_COLLABORATOR_TIMEOUT_MS`: upper bound for a session or role lookup (default: 5000)
/// - `ACCESS_POLICY_PATH`: optional JSON file replacing the built-in policy table
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Upper-cased HTTP method names.
    pub mutating_methods: Vec<String>,
    pub collaborator_timeout: Duration,
    pub policy_path: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mutating_methods: vec!["POST".to_string()],
            collaborator_timeout: Duration::from_millis(5000),
            policy_path: None,
        }
    }
}

impl GateConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mutating_methods = env::var("GATE_MUTATING_METHODS")
            .ok()
            .map(|v| parse_methods(&v))
            .filter(|methods| !methods.is_empty())
            .unwrap_or(defaults.mutating_methods);

        Self {
            mutating_methods,
            collaborator_timeout: env::var("GATE_COLLABORATOR_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.collaborator_timeout),
            policy_path: env::var("ACCESS_POLICY_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_methods(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
