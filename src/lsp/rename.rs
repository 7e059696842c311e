//! Rename for ActionScript and MXML documents.

use tower_lsp::lsp_types::Position;

use crate::analysis::markup::{classify, MarkupTarget};
use crate::analysis::position::{locate, offset_target, OffsetTarget};
use crate::analysis::rename::{build_rename_edit, Refusal, RenameOutcome};
use crate::analysis::{top_level_definitions, Context};
use crate::document::{Dialect, SourceDocument};
use crate::error::Cancelled;
use crate::project::{DefId, NodeId, TagId, UnitId, ATTRIBUTE_ID};

/// Rename whatever is under `position` to `new_name`.
pub fn rename(
    ctx: &Context<'_>,
    document: &SourceDocument,
    position: Position,
    new_name: &str,
) -> Result<RenameOutcome, Cancelled> {
    ctx.checkpoint()?;
    if ctx.project.is_fallback() {
        return Ok(RenameOutcome::Refused(Refusal::FallbackProject));
    }
    let Some(located) = locate(ctx.project, document, position) else {
        return Ok(RenameOutcome::NoTarget);
    };
    ctx.checkpoint()?;

    let target = if document.dialect == Dialect::Markup {
        match classify(ctx, located.unit, located.offset) {
            MarkupTarget::Script(node) => {
                Target::from(ctx.resolver.resolve_for_rename(ctx.project, node))
            }
            MarkupTarget::Definition(definition) => Target::Definition(definition),
            MarkupTarget::AttributeValue { tag, attribute } => {
                id_field(ctx, located.unit, tag, attribute).map_or(Target::Nothing, Target::Definition)
            }
            MarkupTarget::ExternalSource(_) | MarkupTarget::Nothing => Target::Nothing,
            MarkupTarget::Fallthrough => script_target(ctx, located.unit, located.offset),
        }
    } else {
        script_target(ctx, located.unit, located.offset)
    };
    ctx.checkpoint()?;

    match target {
        Target::Definition(definition) => build_rename_edit(ctx, definition, new_name),
        Target::Unresolved => {
            tracing::debug!(path = %document.path.display(), ?position, "cannot rename this element");
            Ok(RenameOutcome::Unresolved)
        }
        Target::Nothing => {
            tracing::debug!(path = %document.path.display(), ?position, "nothing to rename");
            Ok(RenameOutcome::NoTarget)
        }
    }
}

enum Target {
    Definition(DefId),
    /// A node is there but names no definition.
    Unresolved,
    Nothing,
}

impl From<Option<DefId>> for Target {
    fn from(definition: Option<DefId>) -> Self {
        definition.map_or(Target::Unresolved, Target::Definition)
    }
}

fn script_target(ctx: &Context<'_>, unit: UnitId, offset: usize) -> Target {
    match offset_target(ctx.project, unit, offset) {
        OffsetTarget::Node(node) if in_style_block(ctx, node) => Target::Nothing,
        OffsetTarget::Node(node) => Target::from(ctx.resolver.resolve_for_rename(ctx.project, node)),
        // Doc comment references are for navigation only.
        OffsetTarget::DocComment(_) => Target::Unresolved,
        OffsetTarget::Nothing => Target::Nothing,
    }
}

fn in_style_block(ctx: &Context<'_>, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        let Some(node) = ctx.project.node(id) else {
            return false;
        };
        if node.is_style_block() {
            return true;
        }
        current = node.parent;
    }
    false
}

/// The field an `id` attribute declares on the document's class.
fn id_field(ctx: &Context<'_>, unit: UnitId, tag: TagId, attribute: usize) -> Option<DefId> {
    let attribute = ctx
        .project
        .markup(unit)?
        .tag(tag)?
        .attributes
        .get(attribute)
        .filter(|attribute| attribute.name == ATTRIBUTE_ID)?;
    let class = top_level_definitions(ctx.project, unit)
        .into_iter()
        .find(|&id| {
            ctx.project
                .definition(id)
                .is_some_and(|def| def.is_class() && !def.is_private())
        })?;
    let class = ctx.project.definition(class)?;
    class.members().iter().copied().find(|&member| {
        ctx.project
            .definition(member)
            .is_some_and(|def| def.name == attribute.raw_value)
    })
}
