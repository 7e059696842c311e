//! Mapping an editor position to what lies under it.

use tower_lsp::lsp_types::Position;

use crate::document::SourceDocument;
use crate::project::{DocComment, MarkupDocument, MarkupTag, NodeId, Project, TagId, UnitId};

/// An editor position translated into the coordinates of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub unit: UnitId,
    /// Offset into the unit's effective text.
    pub offset: usize,
}

/// What occupies an offset of a script unit.
#[derive(Debug, Clone, Copy)]
pub enum OffsetTarget<'p> {
    Node(NodeId),
    DocComment(&'p DocComment),
    Nothing,
}

/// Translate a position in `document` into a unit and offset.
///
/// Documents spliced into another unit with `include` are translated through
/// the splice into the including unit. `None` means there is nothing to
/// answer here.
pub fn locate(project: &dyn Project, document: &SourceDocument, position: Position) -> Option<Located> {
    let local = document.line_index.offset(position)?;
    match project.include_splice(&document.path) {
        Some(splice) => {
            let offset = splice.to_effective(local)?;
            let unit = project.unit_for_path(&splice.parent)?;
            Some(Located { unit, offset })
        }
        None => {
            let unit = project.unit_for_path(&document.path)?;
            Some(Located {
                unit,
                offset: local,
            })
        }
    }
}

/// The innermost node of the tree rooted at `root` that covers `offset`.
///
/// A child that strictly contains the offset wins over one that merely ends
/// at it; the latter still matches a cursor placed right after an identifier.
pub fn innermost_node(project: &dyn Project, root: NodeId, offset: usize) -> Option<NodeId> {
    if !project.node(root)?.covers(offset) {
        return None;
    }
    let mut current = root;
    loop {
        let node = project.node(current)?;
        let strict = node.children.iter().copied().find(|&child| {
            project
                .node(child)
                .is_some_and(|n| n.span.contains(&offset))
        });
        let next = strict.or_else(|| {
            node.children
                .iter()
                .copied()
                .find(|&child| project.node(child).is_some_and(|n| n.covers(offset)))
        });
        match next {
            Some(child) => current = child,
            None => return Some(current),
        }
    }
}

/// The doc comment or innermost node at an offset of a unit.
pub fn offset_target(project: &dyn Project, unit: UnitId, offset: usize) -> OffsetTarget<'_> {
    if let Some(comment) = project
        .doc_comments(unit)
        .iter()
        .find(|comment| comment.span.contains(&offset))
    {
        return OffsetTarget::DocComment(comment);
    }
    project
        .ast(unit)
        .and_then(|root| innermost_node(project, root, offset))
        .map_or(OffsetTarget::Nothing, OffsetTarget::Node)
}

/// The innermost tag whose element contains the offset.
pub fn offset_tag(markup: &MarkupDocument, offset: usize) -> Option<(TagId, &MarkupTag)> {
    let (mut id, mut tag) = markup.root_tag()?;
    if !tag.span.contains(&offset) {
        return None;
    }
    while let Some((child_id, child)) = tag
        .children
        .iter()
        .filter_map(|&child| Some((child, markup.tag(child)?)))
        .find(|(_, child)| child.span.contains(&offset))
    {
        id = child_id;
        tag = child;
    }
    Some((id, tag))
}

/// The ActionScript node at an offset that lies in one of the tag's embedded
/// script regions.
pub fn embedded_script_node(
    project: &dyn Project,
    unit: UnitId,
    tag: &MarkupTag,
    offset: usize,
) -> Option<NodeId> {
    let region = tag.script_region_at(offset)?;
    let node_id = innermost_node(project, project.ast(unit)?, offset)?;
    let node = project.node(node_id)?;
    (node.span.start >= region.start && node.span.end <= region.end).then_some(node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Dialect, OffsetCue};
    use crate::project::NodeKind;
    use crate::snapshot::SnapshotBuilder;

    #[test]
    fn innermost_prefers_strict_containment() {
        let mut b = SnapshotBuilder::new();
        let unit = b.script("/src/A.as", "a.b");
        let access = b.node(unit, NodeKind::Other, 0..3);
        let a = b.reference(unit, "a", 0, None);
        let bee = b.reference(unit, "b", 0, None);
        let model = b.build();
        let root = model.ast(unit).unwrap();

        assert_eq!(innermost_node(&model, root, 0), Some(a));
        // Offset 1 is just past `a`; no child strictly contains it.
        assert_eq!(innermost_node(&model, root, 1), Some(a));
        assert_eq!(innermost_node(&model, root, 2), Some(bee));
        assert_eq!(innermost_node(&model, root, 3), Some(bee));
        assert_eq!(innermost_node(&model, root, 4), None);
        assert_ne!(Some(access), innermost_node(&model, root, 0));
    }

    #[test]
    fn locate_translates_include_splices() {
        let mut b = SnapshotBuilder::new();
        let unit = b.script("/src/Main.as", "class Main {\ninclude \"part.as\";\n}\n");
        b.include(
            "/src/part.as",
            "/src/Main.as",
            vec![OffsetCue {
                local: 0,
                adjustment: 100,
            }],
        );
        let model = b.build();

        let part = SourceDocument::new("/src/part.as".into(), Dialect::Script, "var x;\nvar y;");
        assert_eq!(
            locate(&model, &part, Position::new(1, 4)),
            Some(Located { unit, offset: 111 })
        );

        let main = SourceDocument::new(
            "/src/Main.as".into(),
            Dialect::Script,
            "class Main {\ninclude \"part.as\";\n}\n",
        );
        assert_eq!(
            locate(&model, &main, Position::new(0, 6)),
            Some(Located { unit, offset: 6 })
        );
        assert_eq!(locate(&model, &main, Position::new(9, 0)), None);
    }

    #[test]
    fn untranslatable_splice_is_not_found() {
        let mut b = SnapshotBuilder::new();
        b.script("/src/Main.as", "class Main {}");
        b.include(
            "/src/part.as",
            "/src/Main.as",
            vec![OffsetCue {
                local: 5,
                adjustment: 10,
            }],
        );
        let model = b.build();
        let part = SourceDocument::new("/src/part.as".into(), Dialect::Script, "var x;");
        assert_eq!(locate(&model, &part, Position::new(0, 1)), None);
    }

    #[test]
    fn doc_comment_shadows_nodes() {
        let mut b = SnapshotBuilder::new();
        let text = "/** @see Other */\nvar x;";
        let unit = b.script("/src/A.as", text);
        b.doc_comment(unit, 0);
        b.reference(unit, "x", 0, None);
        let model = b.build();

        assert!(matches!(
            offset_target(&model, unit, 5),
            OffsetTarget::DocComment(_)
        ));
        assert!(matches!(
            offset_target(&model, unit, text.find('x').unwrap()),
            OffsetTarget::Node(_)
        ));
    }

    #[test]
    fn offset_tag_finds_innermost() {
        let mut b = SnapshotBuilder::new();
        let text = "<s:App xmlns:s=\"x\">\n  <s:Button label=\"go\"/>\n</s:App>";
        let unit = b.markup("/src/App.mxml", text);
        let model = b.build();
        let markup = model.markup(unit).unwrap();

        let (_, tag) = offset_tag(markup, text.find("Button").unwrap()).unwrap();
        assert_eq!(tag.name.local, "Button");
        let (_, tag) = offset_tag(markup, 2).unwrap();
        assert_eq!(tag.name.local, "App");
        assert!(offset_tag(markup, text.len()).is_none());
    }
}
