//! MXML tag trees as exposed by the compiler.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Span, TagId};

/// Attribute naming an external file on `<fx:Script>` and `<fx:Style>`.
pub const ATTRIBUTE_SOURCE: &str = "source";
/// Attribute that declares a field on the document's class.
pub const ATTRIBUTE_ID: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlName {
    #[serde(default)]
    pub prefix: Option<String>,
    pub local: String,
}

/// Language role of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagRole {
    /// `<fx:Script>`
    Script,
    /// `<fx:Style>`
    Style,
    #[default]
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupAttribute {
    pub name: String,
    pub name_span: Span,
    /// Span of the value between the quotes.
    #[serde(default)]
    pub value_span: Option<Span>,
    #[serde(default)]
    pub raw_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupTag {
    pub name: XmlName,
    #[serde(default)]
    pub role: TagRole,
    /// From the opening `<` to the end of the closing tag.
    pub span: Span,
    /// The start tag, `<` through `>`.
    pub open_span: Span,
    /// `prefix:local` inside the start tag.
    pub name_span: Span,
    /// `prefix:local` inside the end tag.
    #[serde(default)]
    pub close_name_span: Option<Span>,
    #[serde(default)]
    pub attributes: Vec<MarkupAttribute>,
    /// Regions compiled as ActionScript: script bodies, bindings, event handlers.
    #[serde(default)]
    pub script_regions: Vec<Span>,
    #[serde(default)]
    pub parent: Option<TagId>,
    #[serde(default)]
    pub children: Vec<TagId>,
}

impl MarkupTag {
    /// Length of `prefix:` in the tag name, zero without a prefix.
    fn prefix_len(&self) -> usize {
        self.name.prefix.as_ref().map_or(0, |p| p.len() + 1)
    }

    /// The local part of the start tag's name.
    pub fn local_name_span(&self) -> Span {
        self.name_span.start + self.prefix_len()..self.name_span.end
    }

    /// The local part of the end tag's name.
    pub fn close_local_name_span(&self) -> Option<Span> {
        let close = self.close_name_span.as_ref()?;
        Some(close.start + self.prefix_len()..close.end)
    }

    /// Whether the offset lies on the namespace prefix of either tag name.
    pub fn is_inside_prefix(&self, offset: usize) -> bool {
        if self.name.prefix.is_none() {
            return false;
        }
        let in_prefix = |start: usize| offset >= start && offset < start + self.prefix_len();
        in_prefix(self.name_span.start)
            || self
                .close_name_span
                .as_ref()
                .is_some_and(|close| in_prefix(close.start))
    }

    /// Whether the offset lies on the tag name, in the start or the end tag.
    pub fn is_offset_in_name(&self, offset: usize) -> bool {
        let within = |span: &Span| span.start <= offset && offset <= span.end;
        within(&self.name_span) || self.close_name_span.as_ref().is_some_and(within)
    }

    /// Whether the offset lies after the tag name but inside the start tag.
    pub fn is_offset_in_attribute_list(&self, offset: usize) -> bool {
        offset > self.name_span.end && offset < self.open_span.end
    }

    /// Whether the offset lies in the tag's content, between the start and end tags.
    pub fn is_offset_in_content(&self, offset: usize) -> bool {
        offset >= self.open_span.end && offset < self.span.end
    }

    /// The attribute whose value contains the offset.
    pub fn attribute_with_value_at(&self, offset: usize) -> Option<(usize, &MarkupAttribute)> {
        self.attributes.iter().enumerate().find(|(_, attribute)| {
            attribute
                .value_span
                .as_ref()
                .is_some_and(|value| value.start <= offset && offset <= value.end)
        })
    }

    /// The attribute whose name contains the offset.
    pub fn attribute_name_at(&self, offset: usize) -> Option<usize> {
        self.attributes.iter().position(|attribute| {
            attribute.name_span.start <= offset && offset <= attribute.name_span.end
        })
    }

    pub fn script_region_at(&self, offset: usize) -> Option<&Span> {
        self.script_regions
            .iter()
            .find(|region| region.start <= offset && offset <= region.end)
    }
}

/// The tag tree of one MXML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupDocument {
    pub path: PathBuf,
    #[serde(default)]
    pub tags: Vec<MarkupTag>,
    #[serde(default)]
    pub root: Option<TagId>,
}

impl MarkupDocument {
    pub fn tag(&self, id: TagId) -> Option<&MarkupTag> {
        self.tags.get(id.index())
    }

    pub fn root_tag(&self) -> Option<(TagId, &MarkupTag)> {
        let id = self.root?;
        Some((id, self.tag(id)?))
    }
}
