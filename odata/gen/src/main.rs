//! OData Code Generator
//!
//! Generates strongly-typed Rust client code from OData `$metadata` documents.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use odata_gen::config::{EnumDedupPolicy, GeneratorConfig, Manifest};
use odata_gen::errors::{ConfigError, GeneratorError};
use odata_gen::output::{DirectorySink, DryRunSink, OutputSink};
use odata_gen::pass::GenerationPass;
use odata_gen::request::GenerationRequest;
use odata_gen::source::DefaultMetadataSource;
use tracing::{Level, info, warn};

/// OData code generator - transforms service metadata into typed Rust clients
#[derive(Parser, Debug)]
#[command(name = "odata-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Manifest listing the clients to generate
    #[arg(short, long, default_value = "odata-gen.toml")]
    manifest: PathBuf,

    /// Metadata URL or path of a single client (replaces the manifest's clients)
    #[arg(long, requires_all = ["service", "namespace"])]
    source: Option<String>,

    /// Facade type name for --source
    #[arg(long)]
    service: Option<String>,

    /// Namespace the facade is emitted into for --source
    #[arg(long)]
    namespace: Option<String>,

    /// Output directory for generated code
    #[arg(short, long, default_value = "src/odata")]
    output: PathBuf,

    /// Rust path the output directory is mounted at (e.g., "crate::odata")
    #[arg(long)]
    module_root: Option<String>,

    /// How repeated enum declarations are handled
    #[arg(long, value_enum)]
    enum_dedup: Option<EnumDedupPolicy>,

    /// Metadata fetch timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// The single request given on the command line, if any.
    fn request(&self) -> Result<Option<GenerationRequest>, ConfigError> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        let service = self
            .service
            .as_ref()
            .ok_or(ConfigError::IncompleteRequest("--service"))?;
        let namespace = self
            .namespace
            .as_ref()
            .ok_or(ConfigError::IncompleteRequest("--namespace"))?;
        Ok(Some(GenerationRequest::new(source, service, namespace)))
    }

    fn apply_to(&self, config: &mut GeneratorConfig) {
        if let Some(root) = &self.module_root {
            config.module_root = root.clone();
        }
        if let Some(policy) = self.enum_dedup {
            config.enum_dedup = policy;
        }
        if let Some(secs) = self.timeout {
            config.fetch_timeout = Duration::from_secs(secs);
        }
    }
}

fn main() -> Result<(), GeneratorError> {
    let cli = Cli::parse();

    // Setup tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let manifest = Manifest::load(&cli.manifest)?;
    if manifest.is_none() {
        info!("No manifest at {}", cli.manifest.display());
    }

    let mut config = GeneratorConfig::default();
    if let Some(manifest) = &manifest {
        manifest.apply_to(&mut config);
    }
    cli.apply_to(&mut config);

    let requests = match cli.request()? {
        Some(request) => vec![request],
        None => manifest.as_ref().map(Manifest::requests).unwrap_or_default(),
    };

    if requests.is_empty() {
        warn!("Nothing to generate");
        return Ok(());
    }

    info!(
        "Generating {} client(s) into {} (module root {})",
        requests.len(),
        cli.output.display(),
        config.module_root
    );

    let source = DefaultMetadataSource::new(config.fetch_timeout)?;
    let mut sink: Box<dyn OutputSink> = if cli.dry_run {
        Box::new(DryRunSink::default())
    } else {
        Box::new(DirectorySink::new(&cli.output))
    };

    let mut pass = GenerationPass::new(config)?;
    let report = pass.run(&requests, &source, sink.as_mut());
    sink.finish()?;

    report.print();

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}
