//! What an offset inside an MXML document refers to.
//!
//! Script bodies and binding expressions are compiled as ActionScript, so an
//! offset in one of them is handed back to the script resolver. Tag names and
//! attribute names are bound to definitions by the compiler. The `source`
//! attribute of `<fx:Script>` and `<fx:Style>` names a file to jump to.

use std::path::PathBuf;

use crate::project::{DefId, MarkupTag, NodeId, TagId, TagRole, UnitId, ATTRIBUTE_SOURCE};

use super::position::{embedded_script_node, offset_tag};
use super::Context;

/// Outcome of classifying a markup offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupTarget {
    /// An ActionScript node embedded in the document.
    Script(NodeId),
    /// A tag or attribute name bound to a definition.
    Definition(DefId),
    /// The value of a `source` attribute: the file it names.
    ExternalSource(PathBuf),
    /// An attribute value with no script inside it.
    AttributeValue { tag: TagId, attribute: usize },
    /// Markup with no meaning for navigation, including namespace prefixes.
    Nothing,
    /// Not markup-specific; resolve the raw offset as script.
    Fallthrough,
}

/// Tags offer markup-level lookups everywhere except inside the body of a
/// script or style block.
fn has_code_intelligence(tag: &MarkupTag, offset: usize) -> bool {
    match tag.role {
        TagRole::Script | TagRole::Style => !tag.is_offset_in_content(offset),
        TagRole::Component => true,
    }
}

pub fn classify(ctx: &Context<'_>, unit: UnitId, offset: usize) -> MarkupTarget {
    let Some(markup) = ctx.project.markup(unit) else {
        return MarkupTarget::Fallthrough;
    };
    let Some((tag_id, tag)) = offset_tag(markup, offset) else {
        return MarkupTarget::Fallthrough;
    };

    if let Some(node) = embedded_script_node(ctx.project, unit, tag, offset) {
        return MarkupTarget::Script(node);
    }
    if !has_code_intelligence(tag, offset) {
        tracing::trace!(offset, tag = %tag.name.local, "offset inside script or style body");
        return MarkupTarget::Fallthrough;
    }
    if tag.is_inside_prefix(offset) {
        return MarkupTarget::Nothing;
    }

    let definition = if tag.is_offset_in_name(offset) {
        ctx.project.resolve_tag(unit, tag_id)
    } else {
        tag.attribute_name_at(offset)
            .and_then(|attribute| ctx.project.resolve_attribute(unit, tag_id, attribute))
    };
    if let Some(definition) = definition {
        return MarkupTarget::Definition(definition);
    }

    let Some((index, attribute)) = tag.attribute_with_value_at(offset) else {
        return MarkupTarget::Nothing;
    };
    let names_external_file = matches!(tag.role, TagRole::Script | TagRole::Style)
        && tag.is_offset_in_attribute_list(offset)
        && attribute.name == ATTRIBUTE_SOURCE;
    if names_external_file {
        let path = PathBuf::from(&attribute.raw_value);
        let path = match markup.path.parent() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        };
        return MarkupTarget::ExternalSource(path);
    }
    MarkupTarget::AttributeValue {
        tag: tag_id,
        attribute: index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOptions;
    use crate::snapshot::SnapshotBuilder;
    use tokio_util::sync::CancellationToken;

    const APP: &str = r#"<s:Application xmlns:fx="http://ns.adobe.com/mxml/2009" xmlns:s="library://ns.adobe.com/flex/spark">
  <fx:Script source="includes/logic.as"/>
  <fx:Script><![CDATA[
    var count:int = 0;
  ]]></fx:Script>
  <fx:Style>
    .big { fontSize: 20; }
  </fx:Style>
  <s:Button id="go" label="Go" click="{count}"/>
</s:Application>
"#;

    fn classify_at(needle: &str, delta: usize) -> MarkupTarget {
        let mut b = SnapshotBuilder::new();
        let unit = b.markup("/src/app/App.mxml", APP);
        let pkg = b.package(unit, "app");
        let app = b.markup_class(unit, Some(pkg), "App");
        let count = b.field(unit, app, "count");
        b.reference(unit, "count", 1, Some(count));
        let button_class = b.library_class("/libs/spark.swc", "spark.components", "Button");
        let button = b.tag(unit, "Button", 0);
        b.bind_tag(unit, button, button_class);
        let label = b.library_member(button_class, "label");
        b.bind_attribute(unit, button, 1, label);
        let model = b.build();

        let options = AnalysisOptions::default();
        let cancel = CancellationToken::new();
        let ctx = Context::new(&model, &options, &cancel);
        classify(&ctx, unit, APP.find(needle).unwrap() + delta)
    }

    #[test]
    fn source_attribute_names_a_sibling_file() {
        assert_eq!(
            classify_at("includes/logic.as", 3),
            MarkupTarget::ExternalSource(PathBuf::from("/src/app/includes/logic.as"))
        );
    }

    #[test]
    fn script_bodies_switch_dialect() {
        assert!(matches!(
            classify_at("count:int", 2),
            MarkupTarget::Script(_)
        ));
        assert!(matches!(
            classify_at("{count}", 2),
            MarkupTarget::Script(_)
        ));
    }

    #[test]
    fn style_body_falls_through() {
        assert_eq!(classify_at("fontSize", 0), MarkupTarget::Fallthrough);
    }

    #[test]
    fn names_and_prefixes() {
        assert!(matches!(
            classify_at("Button id", 2),
            MarkupTarget::Definition(_)
        ));
        assert!(matches!(
            classify_at("label=", 1),
            MarkupTarget::Definition(_)
        ));
        assert_eq!(classify_at("s:Button", 0), MarkupTarget::Nothing);
        assert!(matches!(
            classify_at("\"go\"", 1),
            MarkupTarget::AttributeValue { attribute: 0, .. }
        ));
    }
}
