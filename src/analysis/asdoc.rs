//! Cross-references inside ASDoc comments.
//!
//! Tags such as `@see flash.events.Event#type` or `@copy #draw()` name a type,
//! a member of a type, or a member of the documented file's own type. The
//! reference is the first word after the tag name.

use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::{Position, Range};

use crate::project::{DefId, DocComment, DocTag, UnitId};

use super::scope::{definition_by_qualified_name, primary_definition, unit_package};
use super::Context;

/// Tags whose first word may be a reference.
const REFERENCE_TAGS: &[&str] = &["see", "copy", "throws", "inheritDoc"];

/// `Type`, `pkg.Type`, `pkg.Type#member`, `Type#member()` or `#member`.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\w+\.)*\w+(?:#\w+(?:\(\))?)?$|^#\w+(?:\(\))?$").unwrap()
});

/// A parsed reference token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocReference<'a> {
    /// `None` for `#member`, meaning the documented file's own type.
    pub type_name: Option<&'a str>,
    pub member: Option<&'a str>,
    /// The member was written with `()`.
    pub must_be_function: bool,
}

pub fn parse_reference(token: &str) -> Option<DocReference<'_>> {
    if !REFERENCE_PATTERN.is_match(token) {
        return None;
    }
    let (type_name, member) = match token.split_once('#') {
        Some((type_name, member)) => (type_name, Some(member)),
        None => (token, None),
    };
    let (member, must_be_function) = match member {
        Some(member) => match member.strip_suffix("()") {
            Some(name) => (Some(name), true),
            None => (Some(member), false),
        },
        None => (None, false),
    };
    Some(DocReference {
        type_name: (!type_name.is_empty()).then_some(type_name),
        member,
        must_be_function,
    })
}

/// The reference tag on the cursor's line whose span contains the cursor.
pub fn tag_at(comment: &DocComment, position: Position) -> Option<&DocTag> {
    comment.tags.iter().find(|tag| {
        REFERENCE_TAGS.contains(&tag.name.as_str())
            && tag.line == position.line
            && tag.end_line == tag.line
            && tag.column < position.character
            && position.character <= tag.end_column
    })
}

/// The first word of a tag's description and the range it occupies.
fn reference_token(tag: &DocTag) -> Option<(&str, Range)> {
    let trimmed = tag.description.trim_start();
    let token = trimmed.split_whitespace().next()?;
    let leading = tag.description.len() - trimmed.len();
    let start = tag.description_column() + utf16_len(&tag.description[..leading]);
    let end = start + utf16_len(token);
    Some((
        token,
        Range::new(
            Position::new(tag.line, start),
            Position::new(tag.line, end),
        ),
    ))
}

fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

/// Resolve the reference under the cursor in a doc comment of `unit`.
///
/// Returns the referenced definition and the range of the reference token.
pub fn resolve_reference(
    ctx: &Context<'_>,
    unit: UnitId,
    comment: &DocComment,
    position: Position,
) -> Option<(DefId, Range)> {
    let tag = tag_at(comment, position)?;
    let (token, origin) = reference_token(tag)?;
    let reference = parse_reference(token)?;
    tracing::debug!(tag = %tag.name, token, "resolving doc comment reference");

    let owner = match reference.type_name {
        Some(type_name) => resolve_name(ctx, unit, type_name, reference.member.is_some())?,
        None => primary_definition(ctx.project, unit)?,
    };
    let definition = match reference.member {
        Some(member) => find_member(ctx, owner, member, reference.must_be_function)?,
        None => owner,
    };
    Some((definition, origin))
}

/// Look up a definition by qualified name, retrying unqualified names in the
/// current file's package. Only classes and interfaces own members.
fn resolve_name(ctx: &Context<'_>, unit: UnitId, name: &str, has_member: bool) -> Option<DefId> {
    let accept = |id: &DefId| {
        !has_member || ctx.project.definition(*id).is_some_and(|def| def.is_type())
    };
    definition_by_qualified_name(ctx.project, name)
        .filter(accept)
        .or_else(|| {
            if name.contains('.') {
                return None;
            }
            let package = unit_package(ctx.project, unit)?;
            definition_by_qualified_name(ctx.project, &format!("{package}.{name}")).filter(accept)
        })
}

fn find_member(ctx: &Context<'_>, owner: DefId, name: &str, must_be_function: bool) -> Option<DefId> {
    let owner = ctx.project.definition(owner)?;
    owner.members().iter().copied().find(|&id| {
        ctx.project.definition(id).is_some_and(|member| {
            member.name == name && (!must_be_function || member.is_function())
        })
    })
}
