pub mod generate;
pub mod parse;
pub mod types;

pub use parse::{load_config, ConfigError};
pub use types::Config;

use regex::Regex;
use std::path::{Path, PathBuf};

/// Expand `$env{VAR}` references. Unset variables are left as-is so the
/// loader can report them all at once.
pub fn expand_env_vars(text: &str) -> String {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();

    re.replace_all(text, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .to_string()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();

    if let Some(rest) = text.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if text == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }

    path.to_path_buf()
}

/// First existing config file: explicit `--config` path, then
/// `~/.config/meteoship/config.yml`, then `/etc/meteoship/config.yml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(home) = dirs::home_dir() {
        let user_config = home.join(".config/meteoship/config.yml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/meteoship/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}
