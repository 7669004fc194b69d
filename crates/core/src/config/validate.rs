use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - The ladder builds a valid rendition plan
/// - Accepted suffixes start with '.'
/// - The per-tier encoder timeout fits inside the run timeout
/// - At least one run may be in flight
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Ladder validation
    config
        .rendition_plan()
        .map_err(|e| ConfigError::ValidationError(format!("ladder: {}", e)))?;

    // Transcode validation
    let transcode = &config.transcode;
    if transcode.accepted_suffixes.is_empty() {
        return Err(ConfigError::ValidationError(
            "transcode.accepted_suffixes cannot be empty".to_string(),
        ));
    }
    if let Some(suffix) = transcode
        .accepted_suffixes
        .iter()
        .find(|s| s.len() < 2 || !s.starts_with('.'))
    {
        return Err(ConfigError::ValidationError(format!(
            "transcode.accepted_suffixes: {:?} must start with '.'",
            suffix
        )));
    }
    if transcode.max_concurrent_runs == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.max_concurrent_runs must be at least 1".to_string(),
        ));
    }
    if config.encoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.encoder.timeout_secs >= transcode.run_timeout_secs {
        return Err(ConfigError::ValidationError(format!(
            "encoder.timeout_secs ({}) must be below transcode.run_timeout_secs ({})",
            config.encoder.timeout_secs, transcode.run_timeout_secs
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::TierDefinition;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_duplicate_tiers_fail() {
        let mut config = Config::default();
        config.ladder.tiers = Some(vec![
            TierDefinition::new("720p", (1280, 720), 2500, 5000, 128, 21),
            TierDefinition::new("720P", (1280, 720), 2500, 5000, 128, 21),
        ]);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_odd_dimensions_fail() {
        let mut config = Config::default();
        config.ladder.tiers = Some(vec![TierDefinition::new(
            "odd",
            (853, 480),
            1000,
            2000,
            128,
            23,
        )]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_suffix_without_dot_fails() {
        let mut config = Config::default();
        config.transcode.accepted_suffixes = vec!["mp4".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_encoder_timeout_must_fit_run() {
        let mut config = Config::default();
        config.encoder.timeout_secs = 900;
        config.transcode.run_timeout_secs = 840;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("encoder.timeout_secs"));
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.transcode.max_concurrent_runs = 0;
        assert!(validate_config(&config).is_err());
    }
}
