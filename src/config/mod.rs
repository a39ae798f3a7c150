//! Configuration file discovery and loading.

pub use vconv_common::config::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations searched, in order, when no `--config` is given.
const DEFAULT_PATHS: &[&str] = &["./vconv.toml", "~/.config/vconv/config.toml"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    config
        .check()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Load config from the given path, else the first default location that
/// exists, else built-in defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Expand `~` in every path-valued setting.
fn expand_paths(config: &mut Config) {
    for path in [
        &mut config.tools.ffmpeg_path,
        &mut config.tools.ffprobe_path,
        &mut config.conversion.output_dir,
    ]
    .into_iter()
    .flatten()
    {
        *path = expand_tilde(path);
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn sections_are_parsed() {
        let file = write_config(
            r#"
[conversion]
overwrite = false
progress_interval_ms = 250

[controller]
history_size = 5
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(!config.conversion.overwrite);
        assert_eq!(config.conversion.progress_interval_ms, 250);
        assert_eq!(config.conversion.timeout_secs, 86_400);
        assert_eq!(config.controller.history_size, 5);
        assert_eq!(config.controller.event_capacity, 256);
    }

    #[test]
    fn tilde_is_expanded() {
        let file = write_config("[conversion]\noutput_dir = \"~/converted\"\n");
        let config = load_config(file.path()).unwrap();
        let dir = config.conversion.output_dir.unwrap();
        assert!(!dir.to_string_lossy().starts_with('~'), "{dir:?}");
        assert!(dir.ends_with("converted"));
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let file = write_config("[controller]\nevent_capacity = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("event_capacity"));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let file = write_config("[conversion\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn missing_custom_path_is_an_error() {
        let result = load_config_or_default(Some(Path::new("/nonexistent/vconv.toml")));
        assert!(result.is_err());
    }
}
