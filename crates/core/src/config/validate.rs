use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Backend section exists (enforced by serde) and carries an http(s) URL
/// - Server port is not 0
/// - Workflow timings are non-zero
/// - Artifact filenames are non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Backend validation
    let url = config.backend.url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "backend.url cannot be empty".to_string(),
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "backend.url must be an http(s) URL, got '{}'",
            url
        )));
    }

    // Workflow validation
    let workflow = &config.workflow;
    for (name, value) in [
        ("workflow.tick_interval_ms", workflow.tick_interval_ms),
        ("workflow.taxonomy_duration_ms", workflow.taxonomy_duration_ms),
        ("workflow.gartner_duration_ms", workflow.gartner_duration_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }
    if workflow.rendezvous_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "workflow.rendezvous_timeout_ms cannot be 0 (omit it to wait indefinitely)"
                .to_string(),
        ));
    }

    // Downloads validation
    if config.downloads.ppt_filename.trim().is_empty()
        || config.downloads.excel_filename.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "downloads filenames cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::DownloadConfig;
    use crate::config::{BackendConfig, ServerConfig};
    use crate::workflow::WorkflowConfig;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig::default(),
            backend: BackendConfig {
                url: "http://localhost:5000".to_string(),
                timeout_secs: None,
            },
            workflow: WorkflowConfig::default(),
            downloads: DownloadConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_backend_url() {
        let mut config = valid_config();
        config.backend.url = "  ".to_string();
        assert!(validate_config(&config).is_err());

        config.backend.url = "ftp://mapper".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_validate_zero_durations_fail() {
        let mut config = valid_config();
        config.workflow.tick_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.workflow.gartner_duration_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("gartner_duration_ms"));

        let mut config = valid_config();
        config.workflow.rendezvous_timeout_ms = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_filename_fails() {
        let mut config = valid_config();
        config.downloads.excel_filename = String::new();
        assert!(validate_config(&config).is_err());
    }
}
