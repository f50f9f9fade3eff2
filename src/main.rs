use std::path::Path;

use catalog_synth::{
    adapters::FileCatalogSource,
    config::{ProviderConfig, ProviderConfigValidator, load_config},
    core::ConfigurationBuilder,
    ports::CatalogSource,
    tracing_setup,
};
use clap::Parser;
use color_eyre::{Result, eyre::Context};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Commands,

    /// Emit JSON logs instead of the console format
    #[clap(long, global = true)]
    json_logs: bool,

    /// Log filter directive, e.g. "debug" or "catalog_synth=trace"
    #[clap(long, global = true)]
    log_level: Option<String>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Build a routing configuration from a catalog snapshot
    Build {
        /// Catalog snapshot file (.json, .yaml or .toml)
        #[clap(short, long)]
        catalog: String,
        /// Provider configuration file; defaults are used when absent
        #[clap(short, long)]
        config: Option<String>,
        /// Exit with an error when any frontend could not be built
        #[clap(long)]
        strict: bool,
    },
    /// Validate provider configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new provider configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    if let Some(level) = args.log_level.as_deref() {
        tracing_setup::init_tracing_with_config(level, args.json_logs, true)?;
    } else if args.json_logs {
        tracing_setup::init_tracing()?;
    } else {
        tracing_setup::init_console_tracing()?;
    }

    match args.command {
        Commands::Build {
            catalog,
            config,
            strict,
        } => build_command(&catalog, config.as_deref(), strict).await,
        Commands::Validate { config } => validate_config_command(&config).await,
        Commands::Init { config } => init_config_command(&config).await,
    }
}

/// Build the configuration and print it as JSON on stdout
async fn build_command(catalog_path: &str, config_path: Option<&str>, strict: bool) -> Result<()> {
    let provider_config = match config_path {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("Failed to load provider config from {path}"))?,
        None => ProviderConfig::default(),
    };
    ProviderConfigValidator::validate(&provider_config).context("Invalid provider config")?;

    let builder =
        ConfigurationBuilder::new(provider_config).context("Default frontend rule is unusable")?;

    let source = FileCatalogSource::new(catalog_path);
    let catalog = source.snapshot().await?;

    let span = tracing_setup::create_build_span(catalog_path, catalog.len());
    let output = span.in_scope(|| builder.build(&catalog));
    span.record("frontends", output.configuration.frontends.len());
    span.record("backends", output.configuration.backends.len());
    span.record("diagnostics", output.diagnostics.len());

    for diagnostic in &output.diagnostics {
        tracing::warn!(%diagnostic, "Frontend skipped");
    }

    let rendered = serde_json::to_string_pretty(&output.configuration)
        .context("Failed to serialize configuration")?;
    println!("{rendered}");

    if strict && !output.diagnostics.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "{} frontend(s) could not be built",
            output.diagnostics.len()
        ));
    }

    tracing::info!(
        frontends = output.configuration.frontends.len(),
        backends = output.configuration.backends.len(),
        "Configuration built"
    );
    Ok(())
}

/// Validate configuration file
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match ProviderConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Prefix: {:?}", config.prefix);
            println!("   • Domain: {:?}", config.domain);
            println!("   • Exposed by default: {}", config.exposed_by_default);
            println!("   • Frontend rule: {}", config.frontend_rule);
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Leave the trailing '.' off the prefix");
            println!("   • Check that every '{{{{' in frontend_rule has a matching '}}}}'");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Catalog provider configuration

# Attribute namespace; tags look like "traefik.frontend.rule=Host:example.com"
prefix = "traefik"

# Available to rule templates as {{.Domain}}
domain = ""

# Publish services that carry no "enable" attribute
exposed_by_default = true

# Rule used by frontends without a "frontend.rule" attribute
frontend_rule = "Host:{{.ServiceName}}.{{.Domain}}"

# passHostHeader value when the attribute is unset
pass_host_header = true
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'catalog-synth build --catalog <snapshot> --config {config_path}'");
    Ok(())
}
