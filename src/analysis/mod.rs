//! Cross-referencing between editor positions and semantic definitions.
//!
//! - `position`: editor position -> offset -> syntax node, doc comment or tag
//! - `markup`: what an offset inside an MXML tag refers to
//! - `resolve`: syntax node -> definition
//! - `asdoc`: `@see`-style references inside documentation comments
//! - `locations`: definition -> editor locations
//! - `rename`: definition + new name -> multi-file edit
//!
//! Every entry point takes a [`Context`]: the project to query, the options in
//! effect and the request's cancellation token.

pub mod asdoc;
pub mod locations;
pub mod markup;
pub mod position;
pub mod rename;
pub mod resolve;
mod scope;

use std::path::Path;
use std::sync::LazyLock;

use tokio_util::sync::CancellationToken;

use crate::error::{check_cancelled, Cancelled};
use crate::project::Project;

pub use resolve::{FallbackResolver, QualifierFallback, Resolver};
pub use scope::{definition_by_qualified_name, primary_definition, top_level_definitions};

/// Knobs that change how files and definitions are classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Extensions of MXML documents.
    pub markup_extensions: Vec<String>,
    /// Extensions of precompiled library archives.
    pub library_extensions: Vec<String>,
    /// Rename a file along with its main definition.
    pub propose_file_rename: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            markup_extensions: vec!["mxml".to_string()],
            library_extensions: vec!["swc".to_string(), "ane".to_string()],
            propose_file_rename: true,
        }
    }
}

impl AnalysisOptions {
    /// Whether a definition's containing file is a library archive.
    pub fn is_library_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.library_extensions
                    .iter()
                    .any(|lib| lib.eq_ignore_ascii_case(ext))
            })
    }
}

static STANDARD_RESOLVER: LazyLock<Resolver> = LazyLock::new(Resolver::standard);

/// Everything a single request needs to consult.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub project: &'a dyn Project,
    pub options: &'a AnalysisOptions,
    pub resolver: &'a Resolver,
    pub cancel: &'a CancellationToken,
}

impl<'a> Context<'a> {
    pub fn new(
        project: &'a dyn Project,
        options: &'a AnalysisOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            project,
            options,
            resolver: &STANDARD_RESOLVER,
            cancel,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        check_cancelled(self.cancel)
    }
}
