//! Go to definition for ActionScript and MXML documents.

use tower_lsp::lsp_types::{GotoDefinitionResponse, Position};

use crate::analysis::asdoc::resolve_reference;
use crate::analysis::locations::{source_location, to_location_links, to_locations};
use crate::analysis::markup::{classify, MarkupTarget};
use crate::analysis::position::{locate, offset_target, Located, OffsetTarget};
use crate::analysis::Context;
use crate::document::{Dialect, SourceDocument};
use crate::error::Cancelled;

fn nothing() -> GotoDefinitionResponse {
    GotoDefinitionResponse::Array(Vec::new())
}

/// Locations of the definition under `position`.
///
/// Plain locations for symbols, location links for references inside doc
/// comments. No information is an empty array, never an error.
pub fn definition(
    ctx: &Context<'_>,
    document: &SourceDocument,
    position: Position,
) -> Result<GotoDefinitionResponse, Cancelled> {
    ctx.checkpoint()?;
    let Some(located) = locate(ctx.project, document, position) else {
        tracing::debug!(path = %document.path.display(), ?position, "position is not in a known unit");
        return Ok(nothing());
    };
    ctx.checkpoint()?;

    if document.dialect == Dialect::Markup {
        match classify(ctx, located.unit, located.offset) {
            MarkupTarget::Script(node) => {
                let definition = ctx.resolver.resolve_for_navigation(ctx.project, node);
                ctx.checkpoint()?;
                return Ok(GotoDefinitionResponse::Array(to_locations(ctx.project, definition)));
            }
            MarkupTarget::Definition(definition) => {
                ctx.checkpoint()?;
                return Ok(GotoDefinitionResponse::Array(to_locations(
                    ctx.project,
                    Some(definition),
                )));
            }
            MarkupTarget::ExternalSource(path) => {
                let location = source_location(&path);
                return Ok(GotoDefinitionResponse::Array(location.into_iter().collect()));
            }
            MarkupTarget::AttributeValue { .. } | MarkupTarget::Nothing => return Ok(nothing()),
            MarkupTarget::Fallthrough => {}
        }
    }

    script_definition(ctx, located, position)
}

fn script_definition(
    ctx: &Context<'_>,
    located: Located,
    position: Position,
) -> Result<GotoDefinitionResponse, Cancelled> {
    match offset_target(ctx.project, located.unit, located.offset) {
        OffsetTarget::DocComment(comment) => {
            let Some((definition, origin)) = resolve_reference(ctx, located.unit, comment, position)
            else {
                return Ok(nothing());
            };
            ctx.checkpoint()?;
            let locations = to_locations(ctx.project, Some(definition));
            Ok(GotoDefinitionResponse::Link(to_location_links(locations, origin)))
        }
        OffsetTarget::Node(node) => {
            let definition = ctx.resolver.resolve_for_navigation(ctx.project, node);
            ctx.checkpoint()?;
            Ok(GotoDefinitionResponse::Array(to_locations(ctx.project, definition)))
        }
        OffsetTarget::Nothing => Ok(nothing()),
    }
}
