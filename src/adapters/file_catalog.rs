use std::path::PathBuf;

use async_trait::async_trait;
use config::{Config, File, FileFormat};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{core::catalog::CatalogUpdate, ports::catalog_source::CatalogSource};

/// On-disk layout of a captured catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub services: Vec<CatalogUpdate>,
}

/// Catalog source that replays a snapshot file.
///
/// `.json` files are read with serde_json; `.yaml`/`.yml` and `.toml` go
/// through the config crate.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<CatalogSnapshot> {
        let format = match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => {
                return serde_json::from_str(content).with_context(|| {
                    format!("Failed to parse catalog snapshot {}", self.path.display())
                });
            }
        };

        Config::builder()
            .add_source(File::from_str(content, format))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .with_context(|| format!("Failed to parse catalog snapshot {}", self.path.display()))
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn snapshot(&self) -> Result<Vec<CatalogUpdate>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog snapshot {}", self.path.display()))?;
        let snapshot = self.parse(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            services = snapshot.services.len(),
            "Catalog snapshot loaded"
        );
        Ok(snapshot.services)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn test_json_snapshot() -> Result<()> {
        let json_content = r#"
{
  "services": [
    {
      "service": { "name": "api", "attributes": ["traefik.frontend.rule=Host:api.local"] },
      "instances": [
        { "address": "10.0.0.1", "port": 8080, "tags": ["traefik.weight=2"] },
        { "port": 8081, "node": { "name": "n2", "address": "10.0.0.2" } }
      ]
    }
  ]
}
"#;
        let mut temp_file = NamedTempFile::with_suffix(".json")?;
        write!(temp_file, "{}", json_content)?;

        let services = FileCatalogSource::new(temp_file.path()).snapshot().await?;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service.name, "api");
        assert_eq!(services[0].instances.len(), 2);
        assert_eq!(services[0].instances[1].backend_address(), "10.0.0.2");
        Ok(())
    }

    #[tokio::test]
    async fn test_yaml_snapshot() -> Result<()> {
        let yaml_content = r#"
services:
  - service:
      name: web
      attributes:
        - "traefik.enable=true"
    instances:
      - address: "127.0.0.1"
        port: 80
"#;
        let mut temp_file = NamedTempFile::with_suffix(".yaml")?;
        write!(temp_file, "{}", yaml_content)?;

        let services = FileCatalogSource::new(temp_file.path()).snapshot().await?;
        assert_eq!(services[0].service.attributes, vec!["traefik.enable=true"]);
        assert_eq!(services[0].instances[0].port, 80);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = FileCatalogSource::new("/definitely/not/here.json");
        assert!(source.snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_json() -> Result<()> {
        let mut temp_file = NamedTempFile::with_suffix(".json")?;
        write!(temp_file, "{{ not json")?;
        let err = FileCatalogSource::new(temp_file.path())
            .snapshot()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse catalog snapshot"));
        Ok(())
    }
}
