use crate::config::generate::starter_config;
use std::fs;
use std::path::PathBuf;

/// `meteoship config init`: write the starter config, or print it with
/// `--stdout`.
pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let content = starter_config();

    if stdout {
        print!("{}", content);
        return Ok(());
    }

    let config_path = default_config_path();

    if config_path.exists() {
        eprintln!("Error: config file already exists at {}", config_path.display());
        eprintln!("Remove it first or use --stdout to print the config");
        std::process::exit(1);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}

/// `meteoship config validate`: load a config and report the result.
pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.ok_or("No config file found. Use --config to specify a path.")?;

    println!("Validating config file: {}", path.display());

    match crate::config::load_config(&path) {
        Ok(_) => {
            println!("Config is valid");
            Ok(())
        }
        Err(e) => {
            eprintln!("Config validation failed:\n{}", e);
            std::process::exit(1);
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config/meteoship/config.yml"))
        .unwrap_or_else(|| PathBuf::from("/etc/meteoship/config.yml"))
}
