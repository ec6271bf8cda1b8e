//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::InkguardConfig;
use crate::domain::errors::InkguardError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env placeholder pattern is valid")
});

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into InkguardConfig
/// 4. Applies environment variable overrides (INKGUARD_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use inkguard::config::loader::load_config;
///
/// let config = load_config("inkguard.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<InkguardConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(InkguardError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        InkguardError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Loads the configuration file if it exists, otherwise starts from
/// defaults. Environment overrides and validation apply either way.
///
/// # Errors
///
/// Same as [`load_config`] for an existing file; for a missing file only
/// override parsing and validation can fail.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<InkguardConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "No configuration file, using defaults");
    let mut config = InkguardConfig::default();
    finish(&mut config)?;
    Ok(config)
}

/// Parse configuration text as if it had been read from a file
///
/// # Errors
///
/// Returns an error on missing environment variables, malformed TOML or
/// failed validation.
pub fn parse_config(contents: &str) -> Result<InkguardConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: InkguardConfig = toml::from_str(&contents)
        .map_err(|e| InkguardError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    finish(&mut config)?;
    Ok(config)
}

fn finish(config: &mut InkguardConfig) -> Result<()> {
    apply_env_overrides(config)?;

    config.validate().map_err(|e| {
        InkguardError::Configuration(format!("Configuration validation failed: {}", e))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in ENV_PLACEHOLDER.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(InkguardError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using INKGUARD_* prefix
///
/// Environment variables follow the pattern: INKGUARD_<SECTION>_<KEY>
/// For example: INKGUARD_OUTPUT_DIRECTORY, INKGUARD_BATCH_PARALLELISM
fn apply_env_overrides(config: &mut InkguardConfig) -> Result<()> {
    if let Ok(val) = std::env::var("INKGUARD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("INKGUARD_INPUT_MAX_FILE_SIZE_MB") {
        config.input.max_file_size_mb = parse_override("INKGUARD_INPUT_MAX_FILE_SIZE_MB", &val)?;
    }

    if let Ok(val) = std::env::var("INKGUARD_PREPROCESSING_ENABLED") {
        config.preprocessing.enabled = val.parse().unwrap_or(true);
    }

    // Section-owned overrides
    config
        .ocr
        .apply_env_overrides()
        .map_err(|e| InkguardError::Configuration(e.to_string()))?;
    config
        .detection
        .apply_env_overrides()
        .map_err(|e| InkguardError::Configuration(e.to_string()))?;

    if let Ok(val) = std::env::var("INKGUARD_OUTPUT_DIRECTORY") {
        config.output.directory = val.into();
    }
    if let Ok(val) = std::env::var("INKGUARD_OUTPUT_ENABLE_REDACTION") {
        config.output.enable_redaction = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("INKGUARD_OUTPUT_REDACTION_METHOD") {
        config.output.redaction_method =
            serde_json::from_value(serde_json::Value::String(val.clone())).map_err(|_| {
                InkguardError::Configuration(format!(
                    "Invalid INKGUARD_OUTPUT_REDACTION_METHOD value: {}",
                    val
                ))
            })?;
    }

    if let Ok(val) = std::env::var("INKGUARD_BATCH_PARALLELISM") {
        config.batch.parallelism = parse_override("INKGUARD_BATCH_PARALLELISM", &val)?;
    }

    if let Ok(val) = std::env::var("INKGUARD_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("INKGUARD_AUDIT_LOG_PATH") {
        config.audit.log_path = val.into();
    }

    if let Ok(val) = std::env::var("INKGUARD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("INKGUARD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(name: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| InkguardError::Configuration(format!("Invalid {} value: {}", name, val)))
}
