//! Validation, formatting and output sinks for generated code.
//!
//! Every declaration is validated with `syn` and formatted with
//! `prettyplease` before it becomes an [`EmittedArtifact`]. Artifacts then go
//! to an [`OutputSink`]:
//!
//! - [`MemorySink`] - collects artifacts (tests, embedding)
//! - [`DirectorySink`] - one `<key>.rs` file per artifact plus a `mod.rs`
//! - [`DryRunSink`] - prints artifacts to stdout
//!
//! ## Output Structure
//!
//! ```text
//! src/odata/
//! ├── mod.rs                       # pub mod trippin { pub mod models { include!(..) } }
//! ├── Trippin.Models.Person.rs
//! ├── Trippin.Models.Color.rs
//! └── TripPin.TripPinService.rs
//! ```
//!
//! Mount the tree where the configured module root points, e.g. for
//! `module_root = "crate::odata"`:
//!
//! ```ignore
//! mod odata {
//!     include!("odata/mod.rs");
//! }
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: All generated code is validated with `syn` before writing
//! - **Formatting**: Output is formatted with `prettyplease` for consistent style
//! - **Atomic writes**: Uses temp file + rename pattern to prevent partial writes

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tracing::info;

use crate::codegen::Declaration;
use crate::errors::GeneratorError;
use crate::naming;

/// Name of the index file written by [`DirectorySink`].
pub const INDEX_FILE: &str = "mod.rs";

/// A validated, formatted declaration ready for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifact {
    /// Dedup key, `Namespace.Name`; also the output file stem.
    pub key: String,
    pub namespace: String,
    pub name: String,
    /// Formatted Rust source.
    pub text: String,
}

impl EmittedArtifact {
    pub fn file_name(&self) -> String {
        format!("{}.rs", self.key)
    }
}

/// Validates that the generated code is syntactically correct Rust.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if the tokens do not parse as a file.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats generated code using prettyplease.
///
/// Prepends an auto-generated notice as a regular comment.
pub fn format_code(file: &syn::File) -> String {
    let formatted = prettyplease::unparse(file);
    format!(
        "// This code was automatically generated by odata-gen. Do not edit manually.\n\n{}",
        formatted
    )
}

/// Validates and formats a declaration.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` naming the declaration if its
/// tokens are not valid Rust.
pub fn render(declaration: Declaration) -> Result<EmittedArtifact, GeneratorError> {
    let file = validate_code(&declaration.tokens).map_err(|e| {
        GeneratorError::CodeGenError(format!("{}: {}", declaration.key, e))
    })?;

    Ok(EmittedArtifact {
        text: format_code(&file),
        key: declaration.key,
        namespace: declaration.namespace,
        name: declaration.name,
    })
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if:
/// - Parent directories cannot be created
/// - The temp file cannot be written
/// - The rename operation fails
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("rs.tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Receives generated artifacts.
pub trait OutputSink {
    /// Accepts one artifact. Keys are unique within a pass except for
    /// enums regenerated under the legacy dedup policy.
    fn add_source(&mut self, artifact: EmittedArtifact) -> Result<(), GeneratorError>;

    /// Called once after the pass.
    fn finish(&mut self) -> Result<(), GeneratorError> {
        Ok(())
    }
}

/// Collects artifacts in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub artifacts: Vec<EmittedArtifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&EmittedArtifact> {
        self.artifacts.iter().find(|a| a.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.key.as_str()).collect()
    }
}

impl OutputSink for MemorySink {
    fn add_source(&mut self, artifact: EmittedArtifact) -> Result<(), GeneratorError> {
        self.artifacts.push(artifact);
        Ok(())
    }
}

/// Prints artifacts instead of writing them.
#[derive(Debug, Default)]
pub struct DryRunSink {
    count: usize,
}

impl OutputSink for DryRunSink {
    fn add_source(&mut self, artifact: EmittedArtifact) -> Result<(), GeneratorError> {
        self.count += 1;
        println!("\n--- {} ---", artifact.file_name());
        println!("{}", artifact.text);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), GeneratorError> {
        info!("Dry run: {} artifact(s) not written", self.count);
        Ok(())
    }
}

/// Writes each artifact to `<dir>/<key>.rs` and an index `mod.rs` on finish.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    /// File name by namespace, for the index.
    written: BTreeMap<String, Vec<String>>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: BTreeMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl OutputSink for DirectorySink {
    fn add_source(&mut self, artifact: EmittedArtifact) -> Result<(), GeneratorError> {
        let file_name = artifact.file_name();
        let path = self.dir.join(&file_name);
        write_atomic(&path, &artifact.text)?;
        info!("Wrote {}", path.display());

        let files = self.written.entry(artifact.namespace).or_default();
        if !files.contains(&file_name) {
            files.push(file_name);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), GeneratorError> {
        let tokens = assemble_index(&self.written);
        let file = validate_code(&tokens)?;
        let path = self.dir.join(INDEX_FILE);
        write_atomic(&path, &format_code(&file))?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

#[derive(Default)]
struct ModuleNode {
    files: Vec<String>,
    children: BTreeMap<String, ModuleNode>,
}

impl ModuleNode {
    fn to_tokens(&self) -> TokenStream {
        let includes = self.files.iter().map(|file| quote!(include!(#file);));
        let children = self.children.iter().map(|(name, child)| {
            let ident = format_ident!("{}", name);
            let body = child.to_tokens();
            quote! {
                pub mod #ident {
                    #body
                }
            }
        });
        quote! {
            #(#includes)*
            #(#children)*
        }
    }
}

/// Assembles `mod.rs`: one nested `pub mod` per namespace segment, each
/// including the files of its namespace.
///
/// ## Arguments
///
/// * `files` - File names keyed by the namespace they belong to
pub fn assemble_index(files: &BTreeMap<String, Vec<String>>) -> TokenStream {
    let mut root = ModuleNode::default();
    for (namespace, names) in files {
        let mut node = &mut root;
        for segment in naming::namespace_segments(namespace) {
            node = node.children.entry(segment).or_default();
        }
        node.files.extend(names.iter().cloned());
    }
    root.to_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(namespace: &str, name: &str) -> EmittedArtifact {
        let decl = Declaration::new(
            namespace,
            name,
            quote! {
                pub struct Marker;
            },
        );
        render(decl).expect("valid declaration")
    }

    // === validate_code / format_code tests ===

    #[test]
    fn validate_code_rejects_invalid_code() {
        let invalid_tokens = quote! {
            let x =
        };

        match validate_code(&invalid_tokens) {
            Err(GeneratorError::CodeGenError(_)) => {}
            Err(other) => panic!("Unexpected error type: {:?}", other),
            Ok(_) => panic!("Expected error but got success"),
        }
    }

    #[test]
    fn format_code_adds_generated_notice() {
        let file = validate_code(&quote! { pub struct A; }).unwrap();
        let code = format_code(&file);
        assert!(code.starts_with("// This code was automatically generated by odata-gen."));
        assert!(code.contains("pub struct A;"));
    }

    #[test]
    fn render_names_the_broken_declaration() {
        let decl = Declaration::new("NS", "Broken", quote! { pub struct });
        let err = render(decl).unwrap_err();
        assert!(err.to_string().contains("NS.Broken"));
    }

    #[test]
    fn render_keeps_key_and_namespace() {
        let artifact = artifact("Trippin.Models", "Person");
        assert_eq!(artifact.key, "Trippin.Models.Person");
        assert_eq!(artifact.namespace, "Trippin.Models");
        assert_eq!(artifact.file_name(), "Trippin.Models.Person.rs");
    }

    // === write_atomic tests ===

    #[test]
    fn write_atomic_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/file.rs");

        write_atomic(&path, "// hello").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "// hello");
        assert!(!path.with_extension("rs.tmp").exists());
    }

    #[test]
    fn write_atomic_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.rs");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    // === sink tests ===

    #[test]
    fn memory_sink_keeps_emission_order() {
        let mut sink = MemorySink::new();
        sink.add_source(artifact("B", "Second")).unwrap();
        sink.add_source(artifact("A", "First")).unwrap();

        assert_eq!(sink.keys(), vec!["B.Second", "A.First"]);
        assert!(sink.get("A.First").is_some());
    }

    #[test]
    fn directory_sink_writes_files_and_index() {
        let temp = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(temp.path().join("odata"));

        sink.add_source(artifact("Trippin.Models", "Person")).unwrap();
        sink.add_source(artifact("Trippin.Models", "Color")).unwrap();
        sink.add_source(artifact("Trippin", "TripPinService")).unwrap();
        sink.finish().unwrap();

        let dir = sink.dir();
        assert!(dir.join("Trippin.Models.Person.rs").exists());
        assert!(dir.join("Trippin.Models.Color.rs").exists());

        let index = fs::read_to_string(dir.join(INDEX_FILE)).unwrap();
        assert!(index.contains("pub mod trippin {"));
        assert!(index.contains("pub mod models {"));
        assert!(index.contains("include!(\"Trippin.TripPinService.rs\");"));
        assert!(index.contains("include!(\"Trippin.Models.Person.rs\");"));
        assert!(index.contains("include!(\"Trippin.Models.Color.rs\");"));

        let service = index.find("Trippin.TripPinService.rs").unwrap();
        let models = index.find("pub mod models").unwrap();
        assert!(service < models, "namespace files come before child modules");
    }

    #[test]
    fn directory_sink_lists_repeated_keys_once() {
        let temp = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(temp.path());

        sink.add_source(artifact("Demo", "Color")).unwrap();
        sink.add_source(artifact("Demo", "Color")).unwrap();
        sink.finish().unwrap();

        let index = fs::read_to_string(temp.path().join(INDEX_FILE)).unwrap();
        assert_eq!(index.matches("Demo.Color.rs").count(), 1);
    }

    #[test]
    fn empty_index_is_valid() {
        let tokens = assemble_index(&BTreeMap::new());
        assert!(validate_code(&tokens).is_ok());
    }
}
