//! CLI subcommands. Each returns the text to print on success.

pub mod config;
pub mod place;
pub mod preview;
pub mod reconcile;

use vitrail::atelier::ClassSpecError;
use vitrail::musea::CatalogError;
use vitrail::ConfigError;

/// Error type for CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Classes(#[from] ClassSpecError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Split a comma- or whitespace-separated list.
pub(crate) fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
}

/// Parse exactly `N` comma-separated numbers, as in `--size 400,300`.
pub(crate) fn parse_numbers<const N: usize>(
    flag: &str,
    value: &str,
) -> Result<[f64; N], CommandError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(CommandError::Usage(format!(
            "--{} expects {} comma-separated numbers, got '{}'",
            flag, N, value
        )));
    }
    let mut numbers = [0.0; N];
    for (slot, part) in numbers.iter_mut().zip(parts) {
        *slot = part
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| CommandError::Usage(format!("--{}: '{}' is not a number", flag, part)))?;
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        let parts: Vec<&str> = split_list("shadow-sm, shadow  shadow-lg,").collect();
        assert_eq!(parts, vec!["shadow-sm", "shadow", "shadow-lg"]);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers::<2>("size", "400, 300").unwrap(), [400.0, 300.0]);
        assert!(matches!(
            parse_numbers::<4>("anchor", "1,2,3"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            parse_numbers::<2>("size", "400,wide"),
            Err(CommandError::Usage(_))
        ));
        assert!(parse_numbers::<1>("offset", "NaN").is_err());
    }
}
