use std::io::Write;

use axum::http::Method;
use scanlearn::state::load_policy;
use scanlearn_auth::{PolicyTable, Tier};
use scanlearn_config::GateConfig;

#[test]
fn test_load_policy_defaults_to_builtin() {
    let table = load_policy(&GateConfig::default()).unwrap();
    assert_eq!(table.rules().len(), PolicyTable::builtin().rules().len());
}

#[test]
fn test_load_policy_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"path_prefix": "/api/reports", "tier": "ADMIN"}},
            {{"path_prefix": "/api/reports", "tier": "AUTHENTICATED"}}
        ]"#
    )
    .unwrap();

    let config = GateConfig {
        policy_path: Some(file.path().to_path_buf()),
        ..GateConfig::default()
    };
    let table = load_policy(&config).unwrap();

    let classification = table.classify("/api/reports/weekly", &Method::GET);
    assert!(classification.requires(Tier::Admin));
    assert!(classification.requires(Tier::Authenticated));
    assert!(table.classify("/api/scans", &Method::GET).is_unrestricted());
}

#[test]
fn test_load_policy_reports_missing_file() {
    let config = GateConfig {
        policy_path: Some("/nonexistent/policy.json".into()),
        ..GateConfig::default()
    };

    let err = load_policy(&config).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/policy.json"));
}
