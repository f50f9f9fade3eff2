//! Snapshot files replayed through the builder.
use std::{io::Write, sync::Arc};

use catalog_synth::{
    CatalogSource, ConfigurationBuilder, FileCatalogSource, ProviderConfig,
    config::load_config,
};
use tempfile::NamedTempFile;

const SNAPSHOT: &str = r#"
{
  "services": [
    {
      "service": {
        "name": "api",
        "attributes": [
          "traefik.frontend.rule=Host:api.example.com",
          "traefik.frontends.admin.rule=Host:admin.example.com",
          "traefik.frontend.errors.nf.status=404",
          "traefik.frontend.errors.nf.backend=pages"
        ]
      },
      "instances": [
        { "address": "10.0.0.1", "port": 8080, "tags": ["traefik.weight=5"] },
        { "port": 8080, "tags": ["traefik.enable=false"], "node": { "name": "n2", "address": "10.0.0.2" } },
        { "port": 8081, "node": { "name": "n3", "address": "10.0.0.3" } }
      ]
    },
    {
      "service": { "name": "hidden", "attributes": ["traefik.enable=false"] },
      "instances": [ { "address": "10.0.1.1", "port": 80 } ]
    }
  ]
}
"#;

fn snapshot_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[tokio::test]
async fn build_from_json_snapshot() {
    let file = snapshot_file(SNAPSHOT, ".json");
    let source: Arc<dyn CatalogSource> = Arc::new(FileCatalogSource::new(file.path()));

    let catalog = source.snapshot().await.unwrap();
    assert_eq!(catalog.len(), 2);

    let output = ConfigurationBuilder::new(ProviderConfig::default())
        .unwrap()
        .build(&catalog);
    let config = output.configuration;

    assert_eq!(
        config.frontends.keys().collect::<Vec<_>>(),
        vec!["frontend-api", "frontend-api-admin"]
    );
    assert_eq!(config.backends.len(), 1);

    let servers = &config.backends["backend-api"].servers;
    assert_eq!(servers.len(), 2);
    assert!(servers.keys().any(|id| id.starts_with("api-0-")));
    assert!(servers.keys().any(|id| id.starts_with("api-2-")));
    assert!(servers.values().any(|s| s.url == "http://10.0.0.3:8081" && s.weight == 1));
    assert!(servers.values().any(|s| s.url == "http://10.0.0.1:8080" && s.weight == 5));

    for frontend in config.frontends.values() {
        assert_eq!(frontend.backend, "backend-api");
        let errors = frontend.errors.as_ref().unwrap();
        assert_eq!(errors["nf"].backend, "backend-pages");
    }
}

#[tokio::test]
async fn provider_config_drives_default_rule() {
    let config_file = snapshot_file(
        r#"
domain = "service.consul"
frontend_rule = "Host:{{.ServiceName}}.{{.Domain}}"
"#,
        ".toml",
    );
    let provider = load_config(config_file.path().to_str().unwrap())
        .await
        .unwrap();

    let snapshot = snapshot_file(
        r#"{ "services": [ { "service": { "name": "web" }, "instances": [ { "address": "127.0.0.1", "port": 80 } ] } ] }"#,
        ".json",
    );
    let catalog = FileCatalogSource::new(snapshot.path())
        .snapshot()
        .await
        .unwrap();

    let output = ConfigurationBuilder::new(provider).unwrap().build(&catalog);
    assert_eq!(
        output.configuration.frontends["frontend-web"].routes["route-host-web"].rule,
        "Host:web.service.consul"
    );
}

#[tokio::test]
async fn empty_snapshot_file() {
    let file = snapshot_file("{}", ".json");
    let catalog = FileCatalogSource::new(file.path()).snapshot().await.unwrap();
    assert!(catalog.is_empty());

    let output = ConfigurationBuilder::new(ProviderConfig::default())
        .unwrap()
        .build(&catalog);
    assert!(output.configuration.is_empty());
}
