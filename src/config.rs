use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MockerError, Result};

/// Configuration for a generation run.
///
/// The defaults are baked in; an optional TOML file can extend the naming
/// table or change the package filter. The resolved record is immutable for
/// the lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Regex matched against package paths to select which packages'
    /// functions are eligible for extraction.
    pub filter: String,

    /// Mapping of package short names to 'proper' naming conventions for
    /// the service, consulted before the generic title-case fallback.
    pub naming_overrides: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut naming_overrides = BTreeMap::new();
        naming_overrides.insert("cloudformation".to_string(), "CloudFormation".to_string());
        naming_overrides.insert("dynamodb".to_string(), "DynamoDB".to_string());
        naming_overrides.insert("ec2".to_string(), "EC2".to_string());
        naming_overrides.insert("sts".to_string(), "STS".to_string());

        Self {
            filter: "github.com/aws/aws-sdk-go-v2/service/".to_string(),
            naming_overrides,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| MockerError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        let file: ConfigFile =
            toml::from_str(&content).map_err(|e| MockerError::Config(e.to_string()))?;

        let mut config = Config::default();
        if let Some(filter) = file.filter {
            config.filter = filter;
        }
        // File entries extend the builtin table and win on conflict.
        for (k, v) in file.naming_overrides {
            config.naming_overrides.insert(k, v);
        }

        Ok(config)
    }

    /// Load configuration with fallback to default
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// On-disk shape; both keys optional so a file can override just one.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    filter: Option<String>,

    #[serde(default)]
    naming_overrides: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_service_table() {
        let config = Config::default();
        assert_eq!(config.naming_overrides.get("sts").unwrap(), "STS");
        assert_eq!(config.naming_overrides.get("dynamodb").unwrap(), "DynamoDB");
        assert!(config.filter.contains("aws-sdk-go-v2/service"));
    }

    #[test]
    fn file_extends_the_builtin_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mocker.toml");
        std::fs::write(
            &path,
            "filter = \"example.com/sdk/\"\n\n[naming_overrides]\ns3 = \"S3\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.filter, "example.com/sdk/");
        assert_eq!(config.naming_overrides.get("s3").unwrap(), "S3");
        // builtin entries survive
        assert_eq!(config.naming_overrides.get("sts").unwrap(), "STS");
    }
}
