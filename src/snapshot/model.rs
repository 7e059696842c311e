use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp::lsp_types::{Location, Range, Url};

use crate::document::{IncludeSplice, LineIndex};
use crate::error::{ScopeError, SnapshotError};
use crate::project::{
    DefId, Definition, DocComment, MarkupDocument, NodeId, Project, ProjectProvider, Span,
    SyntaxNode, TagId, UnitId, UnitKind,
};

use super::{ProjectSnapshot, ScopeSnapshot, UnitSnapshot};

/// A project answered entirely from a snapshot.
#[derive(Debug)]
pub struct ProjectModel {
    fallback: bool,
    units: Vec<UnitSnapshot>,
    nodes: Vec<SyntaxNode>,
    definitions: Vec<Definition>,
    unit_by_path: HashMap<PathBuf, UnitId>,
    line_indexes: Vec<Option<LineIndex>>,
    bindings: HashMap<NodeId, DefId>,
    tag_bindings: HashMap<(UnitId, TagId), DefId>,
    attribute_bindings: HashMap<(UnitId, TagId, usize), DefId>,
    overrides: HashMap<DefId, DefId>,
    includes: HashMap<PathBuf, IncludeSplice>,
}

impl ProjectModel {
    pub fn new(snapshot: ProjectSnapshot) -> Self {
        let unit_by_path = snapshot
            .units
            .iter()
            .enumerate()
            .map(|(i, unit)| (unit.path.clone(), UnitId(i as u32)))
            .collect();
        let line_indexes = snapshot.units.iter().map(unit_line_index).collect();

        let mut tag_bindings = HashMap::new();
        let mut attribute_bindings = HashMap::new();
        for binding in &snapshot.tag_bindings {
            match binding.attribute {
                Some(attribute) => {
                    attribute_bindings
                        .insert((binding.unit, binding.tag, attribute), binding.definition);
                }
                None => {
                    tag_bindings.insert((binding.unit, binding.tag), binding.definition);
                }
            }
        }

        Self {
            fallback: snapshot.fallback,
            unit_by_path,
            line_indexes,
            bindings: snapshot
                .bindings
                .iter()
                .map(|binding| (binding.node, binding.definition))
                .collect(),
            tag_bindings,
            attribute_bindings,
            overrides: snapshot
                .overrides
                .iter()
                .map(|link| (link.function, link.overrides))
                .collect(),
            includes: snapshot
                .includes
                .into_iter()
                .map(|include| (include.path, include.splice))
                .collect(),
            units: snapshot.units,
            nodes: snapshot.nodes,
            definitions: snapshot.definitions,
        }
    }

    /// An empty catch-all project for files outside any configured project.
    pub fn fallback() -> Self {
        Self::new(ProjectSnapshot {
            fallback: true,
            ..ProjectSnapshot::default()
        })
    }

    /// Load a snapshot file written by the compiler front end.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: ProjectSnapshot =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            path = %path.display(),
            units = snapshot.units.len(),
            definitions = snapshot.definitions.len(),
            "loaded project snapshot"
        );
        Ok(Self::new(snapshot))
    }

    fn unit(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.units.get(unit.index())
    }
}

fn unit_line_index(unit: &UnitSnapshot) -> Option<LineIndex> {
    if let Some(text) = &unit.text {
        return Some(LineIndex::new(text.as_str()));
    }
    if !unit.kind.is_source() {
        return None;
    }
    match std::fs::read_to_string(&unit.path) {
        Ok(text) => Some(LineIndex::new(text)),
        Err(err) => {
            tracing::debug!(path = %unit.path.display(), %err, "unit text is not readable");
            None
        }
    }
}

impl Project for ProjectModel {
    fn is_fallback(&self) -> bool {
        self.fallback
    }

    fn units(&self) -> Vec<UnitId> {
        (0..self.units.len() as u32).map(UnitId).collect()
    }

    fn unit_for_path(&self, path: &Path) -> Option<UnitId> {
        self.unit_by_path.get(path).copied()
    }

    fn unit_path(&self, unit: UnitId) -> Option<&Path> {
        self.unit(unit).map(|unit| unit.path.as_path())
    }

    fn unit_kind(&self, unit: UnitId) -> Option<UnitKind> {
        self.unit(unit).map(|unit| unit.kind)
    }

    fn file_scope(&self, unit: UnitId) -> Result<Vec<DefId>, ScopeError> {
        let Some(snapshot) = self.unit(unit) else {
            return Ok(Vec::new());
        };
        match &snapshot.scope {
            ScopeSnapshot::Ready { definitions } => Ok(definitions.clone()),
            ScopeSnapshot::Failed { reason } => Err(ScopeError {
                path: snapshot.path.clone(),
                reason: reason.clone(),
            }),
        }
    }

    fn root_definition(&self, unit: UnitId) -> Result<Option<DefId>, ScopeError> {
        // The root tag's class is known only once the file scope is.
        self.file_scope(unit)?;
        Ok(self.unit(unit).and_then(|unit| unit.root_definition))
    }

    fn ast(&self, unit: UnitId) -> Option<NodeId> {
        self.unit(unit)?.ast
    }

    fn node(&self, node: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(node.index())
    }

    fn definition(&self, def: DefId) -> Option<&Definition> {
        self.definitions.get(def.index())
    }

    fn doc_comments(&self, unit: UnitId) -> &[DocComment] {
        self.unit(unit)
            .map(|unit| unit.doc_comments.as_slice())
            .unwrap_or_default()
    }

    fn markup(&self, unit: UnitId) -> Option<&MarkupDocument> {
        self.unit(unit)?.markup.as_ref()
    }

    fn resolve_node(&self, node: NodeId) -> Option<DefId> {
        self.bindings.get(&node).copied()
    }

    fn resolve_tag(&self, unit: UnitId, tag: TagId) -> Option<DefId> {
        self.tag_bindings.get(&(unit, tag)).copied()
    }

    fn resolve_attribute(&self, unit: UnitId, tag: TagId, attribute: usize) -> Option<DefId> {
        self.attribute_bindings.get(&(unit, tag, attribute)).copied()
    }

    fn overridden_function(&self, def: DefId) -> Option<DefId> {
        self.overrides.get(&def).copied()
    }

    fn locations(&self, def: DefId) -> Vec<Location> {
        let Some(definition) = self.definition(def) else {
            return Vec::new();
        };
        let Ok(uri) = Url::from_file_path(&definition.containing_file) else {
            return Vec::new();
        };
        // Definitions without a name span, such as those in libraries, point
        // at the start of their file.
        let range = definition
            .name_span
            .as_ref()
            .and_then(|span| {
                let unit = self.unit_for_path(&definition.containing_file)?;
                self.editor_range(unit, span)
            })
            .unwrap_or_else(Range::default);
        vec![Location::new(uri, range)]
    }

    fn include_splice(&self, path: &Path) -> Option<IncludeSplice> {
        self.includes.get(path).cloned()
    }

    fn editor_range(&self, unit: UnitId, span: &Span) -> Option<Range> {
        self.line_indexes.get(unit.index())?.as_ref()?.range(span)
    }
}

/// Serves one project for every file it knows, and the fallback project for
/// everything else.
pub struct SnapshotProvider {
    project: Arc<ProjectModel>,
    fallback: Arc<ProjectModel>,
}

impl SnapshotProvider {
    pub fn new(project: ProjectModel) -> Self {
        Self {
            project: Arc::new(project),
            fallback: Arc::new(ProjectModel::fallback()),
        }
    }

    /// A provider with no configured project.
    pub fn empty() -> Self {
        Self::new(ProjectModel::fallback())
    }
}

impl ProjectProvider for SnapshotProvider {
    fn project_for_source(&self, path: &Path) -> Option<Arc<dyn Project>> {
        let owned = self.project.unit_for_path(path).is_some()
            || self.project.include_splice(path).is_some();
        let project: Arc<dyn Project> = if owned {
            self.project.clone()
        } else {
            self.fallback.clone()
        };
        Some(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "units": [
            {
                "path": "/src/Main.as",
                "kind": "script",
                "text": "package {\npublic class Main {\n}\n}\n",
                "ast": 0,
                "scope": { "status": "ready", "definitions": [0] }
            },
            {
                "path": "/src/Broken.as",
                "kind": "script",
                "text": "",
                "scope": { "status": "failed", "reason": "parse error" }
            }
        ],
        "nodes": [
            { "kind": "other", "span": { "start": 0, "end": 34 }, "children": [1] },
            { "kind": "identifier", "name": "Main", "span": { "start": 23, "end": 27 }, "parent": 0 }
        ],
        "definitions": [
            { "name": "", "qualified_name": "", "kind": "package", "members": [1],
              "containing_file": "/src/Main.as" },
            { "name": "Main", "qualified_name": "Main", "kind": "class",
              "containing_file": "/src/Main.as", "parent": 0,
              "name_span": { "start": 23, "end": 27 } }
        ],
        "bindings": [ { "node": 1, "definition": 1 } ],
        "includes": [
            { "path": "/src/part.as", "parent": "/src/Main.as",
              "cues": [ { "local": 0, "adjustment": 12 } ] }
        ]
    }"#;

    fn model() -> ProjectModel {
        ProjectModel::new(serde_json::from_str(SNAPSHOT).unwrap())
    }

    #[test]
    fn answers_from_json() {
        let model = model();
        let main = model.unit_for_path(Path::new("/src/Main.as")).unwrap();
        assert_eq!(model.unit_kind(main), Some(UnitKind::Script));
        assert_eq!(model.file_scope(main), Ok(vec![DefId(0)]));
        assert_eq!(model.resolve_node(NodeId(1)), Some(DefId(1)));

        let locations = model.locations(DefId(1));
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].range.start.line, 1);
        assert_eq!(locations[0].range.start.character, 13);
        assert_eq!(
            model
                .include_splice(Path::new("/src/part.as"))
                .and_then(|splice| splice.to_effective(3)),
            Some(15)
        );
    }

    #[test]
    fn failed_scope_is_an_error() {
        let model = model();
        let broken = model.unit_for_path(Path::new("/src/Broken.as")).unwrap();
        let err = model.file_scope(broken).unwrap_err();
        assert_eq!(err.reason, "parse error");
        assert!(model.root_definition(broken).is_err());
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let missing = ProjectModel::load(Path::new("/nonexistent/as3lsp/index.json"));
        assert!(matches!(missing, Err(SnapshotError::Io { .. })));

        let dir = std::env::temp_dir()
            .join("as3lsp-test")
            .join(format!("snapshot-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.json");
        std::fs::write(&path, "{ \"units\": [").unwrap();
        assert!(matches!(
            ProjectModel::load(&path),
            Err(SnapshotError::Parse { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn provider_falls_back_for_unknown_files() {
        let provider = SnapshotProvider::new(model());
        let owned = provider
            .project_for_source(Path::new("/src/Main.as"))
            .unwrap();
        assert!(!owned.is_fallback());
        let included = provider
            .project_for_source(Path::new("/src/part.as"))
            .unwrap();
        assert!(!included.is_fallback());
        let stray = provider
            .project_for_source(Path::new("/elsewhere/Stray.as"))
            .unwrap();
        assert!(stray.is_fallback());
    }
}
