//! The generation pass.
//!
//! A [`GenerationPass`] walks generation requests in order. For each request
//! it fetches the metadata document, parses it, dispatches every schema
//! element to its emitter and hands the rendered artifacts to an
//! [`OutputSink`]. The pass owns the [`DedupRegistry`], so declarations shared
//! between documents are emitted once per pass.
//!
//! Failures are isolated per request: a fetch, parse, render or write error
//! marks that request as failed in the [`GenerationReport`] and the pass
//! moves on to the next one. Declarations a failed request claimed but never
//! wrote are released, so a later request declaring them still emits them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use odata_define::{SchemaElement, SchemaModel, csdl};
use tracing::{debug, info, warn};

use crate::codegen::{
    Declaration, RecursiveProperties, emit_complex, emit_container, emit_entity, emit_enum,
};
use crate::config::GeneratorConfig;
use crate::errors::{ConfigError, GeneratorError};
use crate::mapping::MappingContext;
use crate::output::{EmittedArtifact, OutputSink, render};
use crate::registry::{Checkpoint, DedupRegistry};
use crate::request::GenerationRequest;
use crate::source::MetadataSource;

/// Cooperative cancellation flag, checked before each request starts.
///
/// Clones share the flag, so a host can cancel from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one request.
#[derive(Debug)]
pub enum RequestOutcome {
    /// The request completed; `artifacts` lists the keys it emitted, in order.
    Generated {
        request: GenerationRequest,
        artifacts: Vec<String>,
    },
    Failed {
        request: GenerationRequest,
        error: GeneratorError,
    },
    /// The pass was cancelled before the request started.
    Cancelled { request: GenerationRequest },
}

impl RequestOutcome {
    pub fn request(&self) -> &GenerationRequest {
        match self {
            Self::Generated { request, .. }
            | Self::Failed { request, .. }
            | Self::Cancelled { request } => request,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-request outcomes of one pass, in request order.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<RequestOutcome>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, RequestOutcome::Generated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(RequestOutcome::is_failed)
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, RequestOutcome::Cancelled { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(RequestOutcome::is_failed)
    }

    /// Total number of artifacts emitted across all requests.
    pub fn artifact_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                RequestOutcome::Generated { artifacts, .. } => artifacts.len(),
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&RequestOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }

    pub fn print(&self) {
        println!("\n=== Generation Summary ===\n");

        if self.succeeded() > 0 {
            println!("Succeeded:");
            for outcome in &self.outcomes {
                if let RequestOutcome::Generated { request, artifacts } = outcome {
                    println!("  {}: {} declarations", request, artifacts.len());
                }
            }
        }

        if self.failed() > 0 {
            println!("\nFailed:");
            for outcome in &self.outcomes {
                if let RequestOutcome::Failed { request, error } = outcome {
                    println!("  {}: {}", request, error);
                }
            }
        }

        if self.cancelled() > 0 {
            println!("\nCancelled:");
            for outcome in &self.outcomes {
                if let RequestOutcome::Cancelled { request } = outcome {
                    println!("  {}", request);
                }
            }
        }

        println!(
            "\nTotal: {} succeeded, {} failed, {} cancelled",
            self.succeeded(),
            self.failed(),
            self.cancelled()
        );
    }
}

/// One run of the generator over a list of requests.
#[derive(Debug)]
pub struct GenerationPass {
    config: GeneratorConfig,
    ctx: MappingContext,
    registry: DedupRegistry,
    cancellation: CancellationToken,
}

impl GenerationPass {
    /// Creates a pass with an empty registry.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::ModuleRoot`] if the configured module root is
    /// not a plain Rust path.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            ctx: MappingContext::new(&config)?,
            config,
            registry: DedupRegistry::new(),
            cancellation: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Keys claimed so far in this pass.
    pub fn registry(&self) -> &DedupRegistry {
        &self.registry
    }

    /// Runs every request in order and reports the outcome of each.
    pub fn run(
        &mut self,
        requests: &[GenerationRequest],
        source: &dyn MetadataSource,
        sink: &mut dyn OutputSink,
    ) -> GenerationReport {
        let mut report = GenerationReport::default();

        for request in requests {
            if self.cancellation.is_cancelled() {
                info!("Cancelled before {}", request);
                report.outcomes.push(RequestOutcome::Cancelled {
                    request: request.clone(),
                });
                continue;
            }

            let outcome = match self.run_request(request, source, sink) {
                Ok(artifacts) => {
                    info!("Generated {} declarations for {}", artifacts.len(), request);
                    RequestOutcome::Generated {
                        request: request.clone(),
                        artifacts,
                    }
                }
                Err(error) => {
                    warn!("Skipping {}: {}", request, error);
                    RequestOutcome::Failed {
                        request: request.clone(),
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        report
    }

    fn run_request(
        &mut self,
        request: &GenerationRequest,
        source: &dyn MetadataSource,
        sink: &mut dyn OutputSink,
    ) -> Result<Vec<String>, GeneratorError> {
        let xml = source.fetch(&request.source)?;
        let model = csdl::parse(&xml)?;
        debug!("{}: {} schema elements", request, model.elements.len());

        let checkpoint = self.registry.checkpoint();
        let mut written = Vec::new();
        let result = self.write_model(request, &model, sink, &mut written);
        if result.is_err() {
            self.release_unwritten(request, checkpoint, &written);
        }
        result.map(|()| written)
    }

    fn write_model(
        &mut self,
        request: &GenerationRequest,
        model: &SchemaModel,
        sink: &mut dyn OutputSink,
        written: &mut Vec<String>,
    ) -> Result<(), GeneratorError> {
        for artifact in self.generate_model(request, model)? {
            let key = artifact.key.clone();
            sink.add_source(artifact)?;
            written.push(key);
        }
        Ok(())
    }

    /// Hands back the claims of a failed request, keeping those whose
    /// artifacts already reached the sink.
    fn release_unwritten(
        &mut self,
        request: &GenerationRequest,
        checkpoint: Checkpoint,
        written: &[String],
    ) {
        let released = self.registry.rollback(checkpoint, written);
        if released > 0 {
            debug!("{}: released {} unwritten declarations", request, released);
        }
    }

    /// Emits and renders every declaration of `model` for `request`.
    ///
    /// Declarations already claimed in this pass are skipped. When rendering
    /// fails, the declarations claimed by this call are released again.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::CodeGenError` if any declaration fails to
    /// validate.
    pub fn generate_model(
        &mut self,
        request: &GenerationRequest,
        model: &SchemaModel,
    ) -> Result<Vec<EmittedArtifact>, GeneratorError> {
        let checkpoint = self.registry.checkpoint();
        let recursive = RecursiveProperties::analyze(&model.elements);

        let mut artifacts = Vec::new();
        for element in &model.elements {
            let Some(declaration) = self.dispatch(element, request, model, &recursive) else {
                continue;
            };
            match render(declaration) {
                Ok(artifact) => artifacts.push(artifact),
                Err(error) => {
                    self.release_unwritten(request, checkpoint, &[]);
                    return Err(error);
                }
            }
        }
        Ok(artifacts)
    }

    fn dispatch(
        &mut self,
        element: &SchemaElement,
        request: &GenerationRequest,
        model: &SchemaModel,
        recursive: &RecursiveProperties,
    ) -> Option<Declaration> {
        debug!("Dispatching {} {}.{}", element.kind(), element.namespace(), element.name());
        match element {
            SchemaElement::EnumType(enum_type) => {
                emit_enum(enum_type, &mut self.registry, self.config.enum_dedup)
            }
            SchemaElement::ComplexType(complex) => {
                emit_complex(complex, &self.ctx, recursive, &mut self.registry)
            }
            SchemaElement::EntityType(entity) => emit_entity(entity, &self.ctx, &mut self.registry),
            SchemaElement::EntityContainer(container) => Some(emit_container(
                container,
                request,
                &model.elements,
                &self.ctx,
            )),
            SchemaElement::Function(_) | SchemaElement::Other(_) => None,
        }
    }
}
