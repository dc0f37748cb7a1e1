//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "workhours.toml";

/// Load configuration from workhours.toml, or from the environment when no file exists
pub fn load_config() -> Result<Config> {
    match find_config_file() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            load_config_from_path(&path)
        }
        Err(Error::ConfigNotFound) => {
            tracing::debug!("no {} found, reading environment", CONFIG_FILENAME);
            Ok(config_from_env(|key| env::var(key).ok()))
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Build a config from `DATABASE_URL`, `JWT_SECRET`, `HOST` and `PORT` over the defaults
fn config_from_env(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let mut config = Config::default();

    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    config.auth.jwt_secret = lookup("JWT_SECRET");
    if let Some(host) = lookup("HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
        config.server.port = port;
    }

    config
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Literal pattern, cannot fail at runtime
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env interpolation pattern is valid");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# workhours configuration

[server]
host = "${HOST:-0.0.0.0}"
port = 8080

[database]
# "memory" keeps everything in-process and loses it on restart.
url = "${DATABASE_URL:-memory}"

[auth]
# Every authenticated request is refused while this is empty.
jwt_secret = "${JWT_SECRET}"
# bcrypt_cost = 12
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_env_interpolation() {
        env::set_var("WORKHOURS_TEST_VAR", "hello");
        let content = "value = \"${WORKHOURS_TEST_VAR}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"hello\"");
        env::remove_var("WORKHOURS_TEST_VAR");
    }

    #[test]
    fn test_env_interpolation_with_default() {
        let content = "value = \"${NONEXISTENT_VAR:-default_value}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"default_value\"");
    }

    #[test]
    fn test_default_template_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(default_config_content().as_bytes()).unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_from_env() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://localhost/workhours"),
            ("JWT_SECRET", "topsecret"),
            ("PORT", "10000"),
        ]
        .into_iter()
        .collect();

        let config = config_from_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.database.url, "postgres://localhost/workhours");
        assert_eq!(config.auth.secret(), Some("topsecret"));
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_config_from_empty_env() {
        let config = config_from_env(|_| None);
        assert!(config.database.is_memory());
        assert!(config.auth.secret().is_none());
    }
}
