//! Computing the edits for renaming a definition.
//!
//! Every source unit that can see the definition is scanned twice: the markup
//! pass collects tag names, attribute names and `id` values bound to it, the
//! script pass collects identifiers that resolve to it. The result is one
//! batch of text edits per touched document, plus a file rename when the
//! definition is the one its file is named after.

use std::path::PathBuf;

use tower_lsp::lsp_types::{
    DocumentChangeOperation, DocumentChanges, OneOf, OptionalVersionedTextDocumentIdentifier,
    RenameFile, ResourceOp, TextDocumentEdit, TextEdit, Url, WorkspaceEdit,
};

use crate::error::Cancelled;
use crate::project::{DefId, Definition, NodeId, Project, Span, TagId, UnitId, ATTRIBUTE_ID};

use super::resolve::base_declaration;
use super::scope::is_principal_definition;
use super::Context;

/// Version attached to document edits.
///
/// Edits are computed against the compiler's snapshot, which may lag behind
/// the editor; the maximum version tells the client to apply them anyway.
const LATEST_VERSION: i32 = i32::MAX;

/// Why a definition cannot be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Packages span many files and directories.
    Package,
    /// The definition lives in a precompiled library.
    CompiledLibrary,
    /// The file belongs to no configured project.
    FallbackProject,
}

/// Text edits for one document, sorted and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEdit {
    pub path: PathBuf,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Everything a rename changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub documents: Vec<DocumentEdit>,
    pub file_rename: Option<FileRename>,
}

impl RenamePlan {
    /// Document edits first, then the file rename.
    pub fn into_workspace_edit(self) -> WorkspaceEdit {
        let mut operations = Vec::with_capacity(self.documents.len() + 1);
        for document in self.documents {
            let Ok(uri) = Url::from_file_path(&document.path) else {
                tracing::warn!(path = %document.path.display(), "skipping edits for non-file path");
                continue;
            };
            operations.push(DocumentChangeOperation::Edit(TextDocumentEdit {
                text_document: OptionalVersionedTextDocumentIdentifier {
                    uri,
                    version: Some(LATEST_VERSION),
                },
                edits: document.edits.into_iter().map(OneOf::Left).collect(),
            }));
        }
        if let Some(rename) = self.file_rename {
            match (Url::from_file_path(&rename.from), Url::from_file_path(&rename.to)) {
                (Ok(old_uri), Ok(new_uri)) => {
                    operations.push(DocumentChangeOperation::Op(ResourceOp::Rename(RenameFile {
                        old_uri,
                        new_uri,
                        options: None,
                        annotation_id: None,
                    })));
                }
                _ => tracing::warn!(from = %rename.from.display(), "skipping file rename"),
            }
        }
        WorkspaceEdit {
            document_changes: Some(DocumentChanges::Operations(operations)),
            ..WorkspaceEdit::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Edit(RenamePlan),
    Refused(Refusal),
    /// Nothing renameable at the requested position.
    NoTarget,
    /// A symbol is at the position, but it resolves to no definition.
    Unresolved,
}

/// Build the edits that rename `definition` to `new_name` everywhere.
pub fn build_rename_edit(
    ctx: &Context<'_>,
    definition: DefId,
    new_name: &str,
) -> Result<RenameOutcome, Cancelled> {
    let project = ctx.project;
    let target = rename_target(project, base_declaration(project, definition));
    let Some(def) = project.definition(target) else {
        return Ok(RenameOutcome::Unresolved);
    };
    if let Some(refusal) = refusal(ctx, def) {
        tracing::debug!(name = %def.qualified_name, ?refusal, "refusing rename");
        return Ok(RenameOutcome::Refused(refusal));
    }

    let units = if def.is_local() || def.is_private() {
        project
            .unit_for_path(&def.containing_file)
            .into_iter()
            .collect()
    } else {
        project.units()
    };

    // A class and its constructor share a name.
    let targets: Vec<DefId> = std::iter::once(target).chain(def.constructor()).collect();

    let mut plan = RenamePlan::default();
    for unit in units {
        ctx.checkpoint()?;
        let is_source = project.unit_kind(unit).is_some_and(|kind| kind.is_source());
        let Some(path) = project.unit_path(unit).filter(|_| is_source) else {
            continue;
        };

        let mut spans = markup_occurrences(project, unit, &targets, def);
        spans.extend(script_occurrences(ctx, unit, &targets));
        let edits: Vec<TextEdit> = disjoint(spans)
            .iter()
            .filter_map(|span| project.editor_range(unit, span))
            .map(|range| TextEdit::new(range, new_name.to_string()))
            .collect();
        if !edits.is_empty() {
            plan.documents.push(DocumentEdit {
                path: path.to_path_buf(),
                edits,
            });
        }

        if ctx.options.propose_file_rename
            && plan.file_rename.is_none()
            && is_principal_definition(project, unit, target)
        {
            plan.file_rename = Some(FileRename {
                from: path.to_path_buf(),
                to: renamed_path(path, new_name),
            });
        }
        ctx.checkpoint()?;
    }

    tracing::debug!(
        name = %def.qualified_name,
        documents = plan.documents.len(),
        file_rename = plan.file_rename.is_some(),
        "built rename edit"
    );
    Ok(RenameOutcome::Edit(plan))
}

fn refusal(ctx: &Context<'_>, def: &Definition) -> Option<Refusal> {
    if def.is_package() {
        return Some(Refusal::Package);
    }
    let in_compiled_unit = ctx
        .project
        .unit_for_path(&def.containing_file)
        .and_then(|unit| ctx.project.unit_kind(unit))
        .is_some_and(|kind| !kind.is_source());
    if in_compiled_unit || ctx.options.is_library_path(&def.containing_file) {
        return Some(Refusal::CompiledLibrary);
    }
    None
}

/// Sort spans and drop any that overlap an earlier one. At a shared start
/// the shortest span is kept.
fn disjoint(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by_key(|span| (span.start, span.end));
    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last() {
            Some(last) if span.start < last.end => {
                if span != *last {
                    tracing::debug!(?span, ?last, "dropping overlapping rename span");
                }
            }
            _ => kept.push(span),
        }
    }
    kept
}

/// Constructors are renamed through the class they construct.
fn rename_target(project: &dyn Project, definition: DefId) -> DefId {
    project
        .definition(definition)
        .filter(|def| def.is_function())
        .and_then(|def| def.parent)
        .filter(|&parent| {
            project
                .definition(parent)
                .is_some_and(|class| class.constructor() == Some(definition))
        })
        .unwrap_or(definition)
}

/// `new_name` with the original extension, in the original directory.
fn renamed_path(path: &std::path::Path, new_name: &str) -> PathBuf {
    let file_name = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{new_name}.{ext}"),
        None => new_name.to_string(),
    };
    path.with_file_name(file_name)
}

/// Tag names, attribute names and `id` values bound to the target.
fn markup_occurrences(
    project: &dyn Project,
    unit: UnitId,
    targets: &[DefId],
    def: &Definition,
) -> Vec<Span> {
    let Some(markup) = project.markup(unit) else {
        return Vec::new();
    };
    if markup.root_tag().is_none() {
        return Vec::new();
    }
    let include_ids =
        def.is_variable() && def.parent.is_some() && root_definition(project, unit) == def.parent;
    let bound = |resolved: Option<DefId>| {
        resolved.is_some_and(|d| targets.contains(&base_declaration(project, d)))
    };

    let mut spans = Vec::new();
    for (index, tag) in markup.tags.iter().enumerate() {
        let tag_id = TagId(index as u32);
        if bound(project.resolve_tag(unit, tag_id)) {
            spans.push(tag.local_name_span());
            spans.extend(tag.close_local_name_span());
        }
        for (attribute_index, attribute) in tag.attributes.iter().enumerate() {
            if bound(project.resolve_attribute(unit, tag_id, attribute_index)) {
                spans.push(attribute.name_span.clone());
            }
            if include_ids && attribute.name == ATTRIBUTE_ID && attribute.raw_value == def.name {
                spans.extend(attribute.value_span.clone());
            }
        }
    }
    spans
}

fn root_definition(project: &dyn Project, unit: UnitId) -> Option<DefId> {
    match project.root_definition(unit) {
        Ok(definition) => definition,
        Err(err) => {
            tracing::debug!(%err, "treating unavailable root definition as absent");
            None
        }
    }
}

/// Identifiers in the unit's syntax tree that resolve to the target.
fn script_occurrences(ctx: &Context<'_>, unit: UnitId, targets: &[DefId]) -> Vec<Span> {
    let project = ctx.project;
    let mut spans = Vec::new();
    let mut stack: Vec<NodeId> = project.ast(unit).into_iter().collect();
    while let Some(id) = stack.pop() {
        let Some(node) = project.node(id) else {
            continue;
        };
        if node.as_identifier().is_some()
            && ctx
                .resolver
                .resolve_identifier(project, id)
                .is_some_and(|resolved| targets.contains(&base_declaration(project, resolved)))
        {
            spans.push(node.span.clone());
        }
        stack.extend(node.children.iter().copied());
    }
    spans
}
