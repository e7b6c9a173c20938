//! Config command - print the effective configuration or its schema.

use std::path::PathBuf;

use clap::Args;
use vitrail::{load_config, load_config_file, RuntimeConfig, CONFIG_FILE_NAME, CONFIG_SCHEMA};

use super::CommandError;

#[derive(Args)]
pub struct ConfigArgs {
    /// Directory containing vitrail.config.json (defaults to the current directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Fail on an unreadable or invalid file instead of using defaults
    #[arg(long)]
    pub strict: bool,

    /// Print the JSON Schema of the configuration file
    #[arg(long)]
    pub schema: bool,
}

pub fn run(args: ConfigArgs) -> Result<String, CommandError> {
    if args.schema {
        return Ok(CONFIG_SCHEMA.to_owned());
    }
    let config = effective(&args)?;
    Ok(serde_json::to_string_pretty(&config)?)
}

fn effective(args: &ConfigArgs) -> Result<RuntimeConfig, CommandError> {
    if !args.strict {
        return Ok(load_config(args.dir.as_deref()));
    }
    let base = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|source| CommandError::Io {
            path: ".".into(),
            source,
        })?,
    };
    let path = base.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(RuntimeConfig::default());
    }
    Ok(load_config_file(&path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrail::ConfigError;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vitrail-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn args(dir: PathBuf, strict: bool) -> ConfigArgs {
        ConfigArgs {
            dir: Some(dir),
            strict,
            schema: false,
        }
    }

    #[test]
    fn test_missing_file_prints_defaults() {
        let dir = scratch_dir("missing");
        let output: RuntimeConfig = serde_json::from_str(&run(args(dir.clone(), true)).unwrap()).unwrap();
        assert_eq!(output, RuntimeConfig::default());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = scratch_dir("override");
        std::fs::write(dir.join(CONFIG_FILE_NAME), r#"{ "hover": { "delayMs": 450 } }"#).unwrap();
        let output: serde_json::Value = serde_json::from_str(&run(args(dir.clone(), false)).unwrap()).unwrap();
        assert_eq!(output["hover"]["delayMs"], 450);
        assert_eq!(output["hover"]["exitMs"], 150);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_invalid_file_is_lenient_unless_strict() {
        let dir = scratch_dir("invalid");
        std::fs::write(dir.join(CONFIG_FILE_NAME), r#"{ "hover": { "previewWidth": -1 } }"#).unwrap();

        let lenient: RuntimeConfig = serde_json::from_str(&run(args(dir.clone(), false)).unwrap()).unwrap();
        assert_eq!(lenient, RuntimeConfig::default());

        assert!(matches!(
            run(args(dir.clone(), true)),
            Err(CommandError::Config(ConfigError::Invalid { field: "hover.previewWidth", .. }))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_schema() {
        let output = run(ConfigArgs {
            dir: None,
            strict: false,
            schema: true,
        })
        .unwrap();
        assert!(output.contains("\"title\": \"Vitrail Configuration\""));
    }
}
