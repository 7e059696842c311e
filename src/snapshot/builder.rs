//! Building snapshots from source text.
//!
//! Spans are found by searching the unit's text for whole words, and nodes are
//! parented by span containment, so a fixture only states which occurrences
//! mean what. Every method panics when the text it is asked to find is not
//! there: a builder is driven by hand-written fixtures, and a missing needle is
//! a mistake in the fixture.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::document::{IncludeSplice, LineIndex, OffsetCue};
use crate::project::{
    DefId, Definition, DefinitionKind, DocComment, DocTag, FunctionClassification,
    MarkupAttribute, MarkupDocument, MarkupTag, NodeId, NodeKind, Span, SyntaxNode, TagId,
    TagRole, UnitId, UnitKind, VariableClassification, Visibility, XmlName,
};

use super::{
    IncludeSnapshot, NodeBinding, OverrideLink, ProjectModel, ProjectSnapshot, ScopeSnapshot,
    TagBinding, UnitSnapshot,
};

#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    units: Vec<UnitSnapshot>,
    nodes: Vec<SyntaxNode>,
    node_units: Vec<UnitId>,
    definitions: Vec<Definition>,
    bindings: HashMap<NodeId, DefId>,
    tag_bindings: Vec<TagBinding>,
    overrides: Vec<OverrideLink>,
    includes: Vec<IncludeSnapshot>,
    /// Declaration node of a definition, bounding searches for its members.
    declarations: HashMap<DefId, NodeId>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> ProjectModel {
        ProjectModel::new(self.snapshot())
    }

    pub fn snapshot(self) -> ProjectSnapshot {
        let mut bindings: Vec<NodeBinding> = self
            .bindings
            .into_iter()
            .map(|(node, definition)| NodeBinding { node, definition })
            .collect();
        bindings.sort_by_key(|binding| binding.node);
        ProjectSnapshot {
            fallback: false,
            units: self.units,
            nodes: self.nodes,
            definitions: self.definitions,
            bindings,
            tag_bindings: self.tag_bindings,
            overrides: self.overrides,
            includes: self.includes,
        }
    }

    // Units

    /// An ActionScript unit.
    pub fn script(&mut self, path: &str, text: &str) -> UnitId {
        self.add_unit(path, UnitKind::Script, Some(text))
    }

    /// An MXML unit. Its tag tree is scanned from the text; style blocks get
    /// a `StyleBlock` node.
    pub fn markup(&mut self, path: &str, text: &str) -> UnitId {
        let unit = self.add_unit(path, UnitKind::Markup, Some(text));
        let document = scan_markup(PathBuf::from(path), text);
        let style_bodies: Vec<Span> = document
            .tags
            .iter()
            .filter(|tag| tag.role == TagRole::Style)
            .filter_map(|tag| {
                let close = tag.close_name_span.as_ref()?;
                Some(tag.open_span.end..close.start - 2)
            })
            .collect();
        self.units[unit.index()].markup = Some(document);
        for body in style_bodies {
            self.node(unit, NodeKind::StyleBlock, body);
        }
        unit
    }

    fn add_unit(&mut self, path: &str, kind: UnitKind, text: Option<&str>) -> UnitId {
        let unit = UnitId(self.units.len() as u32);
        let ast = text.map(|text| {
            let root = NodeId(self.nodes.len() as u32);
            self.nodes.push(SyntaxNode {
                kind: NodeKind::Other,
                span: 0..text.len(),
                parent: None,
                children: Vec::new(),
            });
            self.node_units.push(unit);
            root
        });
        self.units.push(UnitSnapshot {
            path: PathBuf::from(path),
            kind,
            text: text.map(str::to_string),
            ast,
            scope: ScopeSnapshot::default(),
            root_definition: None,
            doc_comments: Vec::new(),
            markup: None,
        });
        unit
    }

    fn text(&self, unit: UnitId) -> &str {
        self.units[unit.index()].text.as_deref().unwrap_or_default()
    }

    fn path(&self, unit: UnitId) -> PathBuf {
        self.units[unit.index()].path.clone()
    }

    /// Make the unit's file scope unavailable.
    pub fn fail_scope(&mut self, unit: UnitId, reason: &str) {
        self.units[unit.index()].scope = ScopeSnapshot::Failed {
            reason: reason.to_string(),
        };
    }

    fn add_to_scope(&mut self, unit: UnitId, def: DefId) {
        if let ScopeSnapshot::Ready { definitions } = &mut self.units[unit.index()].scope {
            definitions.push(def);
        }
    }

    /// Splice `path` into the unit of `parent`.
    pub fn include(&mut self, path: &str, parent: &str, cues: Vec<OffsetCue>) {
        self.includes.push(IncludeSnapshot {
            path: PathBuf::from(path),
            splice: IncludeSplice::new(PathBuf::from(parent), cues),
        });
    }

    // Nodes

    /// The `nth` whole-word occurrence of `needle` in the unit's text.
    pub fn span_of(&self, unit: UnitId, needle: &str, nth: usize) -> Span {
        let text = self.text(unit);
        find_word(text, needle, 0..text.len(), nth)
            .unwrap_or_else(|| panic!("occurrence {nth} of {needle:?} not found"))
    }

    /// Add a node, parented under the innermost node containing its span.
    /// Existing nodes inside the span become its children.
    pub fn node(&mut self, unit: UnitId, kind: NodeKind, span: Span) -> NodeId {
        let root = self.units[unit.index()]
            .ast
            .unwrap_or_else(|| panic!("unit {unit:?} has no syntax tree"));
        let parent = self.innermost_containing(root, &span);
        let id = NodeId(self.nodes.len() as u32);

        let siblings = std::mem::take(&mut self.nodes[parent.index()].children);
        let (adopted, kept): (Vec<NodeId>, Vec<NodeId>) = siblings.into_iter().partition(|&child| {
            let child_span = &self.nodes[child.index()].span;
            span.start <= child_span.start && child_span.end <= span.end
        });
        for &child in &adopted {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(SyntaxNode {
            kind,
            span,
            parent: Some(parent),
            children: adopted,
        });
        self.node_units.push(unit);

        let mut children = kept;
        children.push(id);
        children.sort_by_key(|&child| self.nodes[child.index()].span.start);
        self.nodes[parent.index()].children = children;
        id
    }

    fn innermost_containing(&self, root: NodeId, span: &Span) -> NodeId {
        let mut current = root;
        while let Some(&child) = self.nodes[current.index()].children.iter().find(|&&child| {
            let child_span = &self.nodes[child.index()].span;
            child_span.start <= span.start && span.end <= child_span.end
        }) {
            current = child;
        }
        current
    }

    /// An identifier node, bound to `definition` when given. An identifier
    /// already covering the same span is reused.
    fn identifier(&mut self, unit: UnitId, span: Span, definition: Option<DefId>) -> NodeId {
        let existing = self.nodes.iter().enumerate().position(|(i, node)| {
            self.node_units[i] == unit && node.span == span && node.as_identifier().is_some()
        });
        let id = match existing {
            Some(index) => NodeId(index as u32),
            None => {
                let name = self.text(unit)[span.clone()].to_string();
                self.node(unit, NodeKind::Identifier { name }, span)
            }
        };
        if let Some(definition) = definition {
            self.bindings.insert(id, definition);
        }
        id
    }

    /// An identifier at the `nth` whole-word occurrence of `name`.
    pub fn reference(
        &mut self,
        unit: UnitId,
        name: &str,
        nth: usize,
        definition: Option<DefId>,
    ) -> NodeId {
        let span = self.span_of(unit, name, nth);
        self.identifier(unit, span, definition)
    }

    // Definitions

    fn add_definition(&mut self, definition: Definition) -> DefId {
        let id = DefId(self.definitions.len() as u32);
        self.definitions.push(definition);
        id
    }

    fn definition_mut(&mut self, def: DefId) -> &mut Definition {
        &mut self.definitions[def.index()]
    }

    fn push_member(&mut self, owner: DefId, member: DefId) {
        match &mut self.definition_mut(owner).kind {
            DefinitionKind::Package { members }
            | DefinitionKind::Class { members, .. }
            | DefinitionKind::Interface { members } => members.push(member),
            _ => panic!("{owner:?} cannot have members"),
        }
    }

    fn qualify(&self, owner: Option<DefId>, name: &str) -> String {
        match owner.map(|owner| self.definitions[owner.index()].qualified_name.as_str()) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}.{name}"),
            _ => name.to_string(),
        }
    }

    /// Where to look for the members of `owner`: its declaration, or the
    /// whole unit when it has none.
    fn body(&self, unit: UnitId, owner: DefId) -> Span {
        match self.declarations.get(&owner) {
            Some(node) => self.nodes[node.index()].span.clone(),
            None => 0..self.text(unit).len(),
        }
    }

    pub fn set_visibility(&mut self, def: DefId, visibility: Visibility) {
        self.definition_mut(def).visibility = visibility;
    }

    /// A package declared by the unit; `""` is the unnamed package. Markup
    /// units name their package by directory and have no declaration.
    pub fn package(&mut self, unit: UnitId, name: &str) -> DefId {
        let text = self.text(unit);
        let name_span = find_word(text, &format!("package {name}"), 0..text.len(), 0)
            .filter(|_| !name.is_empty())
            .map(|keyword| keyword.end - name.len()..keyword.end);
        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind: DefinitionKind::Package {
                members: Vec::new(),
            },
            visibility: Visibility::Public,
            containing_file: self.path(unit),
            parent: None,
            name_span,
        });
        self.add_to_scope(unit, def);
        def
    }

    /// A class declared as `class Name { ... }`, with a declaration node
    /// spanning its body.
    pub fn class(&mut self, unit: UnitId, package: Option<DefId>, name: &str) -> DefId {
        let text = self.text(unit);
        let keyword = find_word(text, &format!("class {name}"), 0..text.len(), 0)
            .unwrap_or_else(|| panic!("class {name} not found"));
        let name_span = keyword.end - name.len()..keyword.end;
        let end = block_end(text, name_span.end);

        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: self.qualify(package, name),
            kind: DefinitionKind::Class {
                constructor: None,
                members: Vec::new(),
            },
            visibility: Visibility::Public,
            containing_file: self.path(unit),
            parent: package,
            name_span: Some(name_span.clone()),
        });
        match package {
            Some(package) => self.push_member(package, def),
            None => self.add_to_scope(unit, def),
        }

        let placeholder = NodeKind::ClassDecl {
            name: NodeId(u32::MAX),
            base: None,
        };
        let decl = self.node(unit, placeholder, keyword.start..end);
        let name_node = self.identifier(unit, name_span, Some(def));
        self.nodes[decl.index()].kind = NodeKind::ClassDecl {
            name: name_node,
            base: None,
        };
        self.declarations.insert(def, decl);
        def
    }

    /// The class declared by a markup unit's root tag.
    pub fn markup_class(&mut self, unit: UnitId, package: Option<DefId>, name: &str) -> DefId {
        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: self.qualify(package, name),
            kind: DefinitionKind::Class {
                constructor: None,
                members: Vec::new(),
            },
            visibility: Visibility::Public,
            containing_file: self.path(unit),
            parent: package,
            name_span: None,
        });
        match package {
            Some(package) => self.push_member(package, def),
            None => self.add_to_scope(unit, def),
        }
        self.units[unit.index()].root_definition = Some(def);
        def
    }

    /// Bind the `extends Base` clause of a class declaration.
    pub fn extends(&mut self, unit: UnitId, class: DefId, base: DefId) {
        let decl = self.declarations[&class];
        let base_name = self.definitions[base.index()].name.clone();
        let clause = find_word(
            self.text(unit),
            &format!("extends {base_name}"),
            self.nodes[decl.index()].span.clone(),
            0,
        )
        .unwrap_or_else(|| panic!("extends {base_name} not found"));
        let base_node = self.identifier(unit, clause.end - base_name.len()..clause.end, Some(base));
        if let NodeKind::ClassDecl { base, .. } = &mut self.nodes[decl.index()].kind {
            *base = Some(base_node);
        }
    }

    /// A function declaration inside `owner`, found as `function name`.
    fn function(
        &mut self,
        unit: UnitId,
        owner: DefId,
        name: &str,
        classification: FunctionClassification,
    ) -> DefId {
        let text = self.text(unit);
        let keyword = find_word(text, &format!("function {name}"), self.body(unit, owner), 0)
            .unwrap_or_else(|| panic!("function {name} not found"));
        let name_span = keyword.end - name.len()..keyword.end;
        let end = block_end(text, name_span.end);
        let line_start = text[..keyword.start].rfind('\n').map_or(0, |i| i + 1);
        let is_override = find_word(text, "override", line_start..keyword.start, 0).is_some();
        let visibility = if find_word(text, "private", line_start..keyword.start, 0).is_some() {
            Visibility::Private
        } else {
            Visibility::Public
        };

        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: self.qualify(Some(owner), name),
            kind: DefinitionKind::Function {
                classification,
                is_override,
            },
            visibility,
            containing_file: self.path(unit),
            parent: Some(owner),
            name_span: Some(name_span.clone()),
        });
        self.declare(unit, def, keyword.start..end, name_span);
        def
    }

    fn declare(&mut self, unit: UnitId, def: DefId, span: Span, name_span: Span) {
        let placeholder = NodeKind::Declaration {
            name: NodeId(u32::MAX),
        };
        let decl = self.node(unit, placeholder, span);
        let name = self.identifier(unit, name_span, Some(def));
        self.nodes[decl.index()].kind = NodeKind::Declaration { name };
        self.declarations.insert(def, decl);
    }

    /// A method of `class`.
    pub fn method(&mut self, unit: UnitId, class: DefId, name: &str) -> DefId {
        let def = self.function(unit, class, name, FunctionClassification::ClassMember);
        self.push_member(class, def);
        def
    }

    /// A local function declared inside `function`.
    pub fn local_function(&mut self, unit: UnitId, function: DefId, name: &str) -> DefId {
        self.function(unit, function, name, FunctionClassification::Local)
    }

    /// The constructor of `class`, found as `function ClassName`.
    pub fn constructor(&mut self, unit: UnitId, class: DefId) -> DefId {
        let name = self.definitions[class.index()].name.clone();
        let def = self.function(unit, class, &name, FunctionClassification::ClassMember);
        if let DefinitionKind::Class { constructor, .. } = &mut self.definition_mut(class).kind {
            *constructor = Some(def);
        }
        def
    }

    /// A variable found as `var name` inside `owner`, up to the end of its
    /// statement.
    fn variable(
        &mut self,
        unit: UnitId,
        owner: DefId,
        name: &str,
        classification: VariableClassification,
    ) -> DefId {
        let text = self.text(unit);
        let keyword = find_word(text, &format!("var {name}"), self.body(unit, owner), 0)
            .unwrap_or_else(|| panic!("var {name} not found"));
        let name_span = keyword.end - name.len()..keyword.end;
        let end = text[name_span.end..]
            .find([';', '\n'])
            .map_or(text.len(), |i| name_span.end + i + 1);
        let line_start = text[..keyword.start].rfind('\n').map_or(0, |i| i + 1);
        let visibility = if find_word(text, "private", line_start..keyword.start, 0).is_some() {
            Visibility::Private
        } else {
            Visibility::Public
        };

        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: self.qualify(Some(owner), name),
            kind: DefinitionKind::Variable { classification },
            visibility,
            containing_file: self.path(unit),
            parent: Some(owner),
            name_span: Some(name_span.clone()),
        });
        self.declare(unit, def, keyword.start..end, name_span);
        def
    }

    /// A field of `class`.
    pub fn field(&mut self, unit: UnitId, class: DefId, name: &str) -> DefId {
        let def = self.variable(unit, class, name, VariableClassification::ClassMember);
        self.push_member(class, def);
        def
    }

    /// A local variable of `function`.
    pub fn local(&mut self, unit: UnitId, function: DefId, name: &str) -> DefId {
        self.variable(unit, function, name, VariableClassification::Local)
    }

    /// A field of a markup class declared by `id="name"` on one of its tags.
    pub fn id_field(&mut self, unit: UnitId, class: DefId, name: &str) -> DefId {
        let value_span = self.units[unit.index()]
            .markup
            .as_ref()
            .and_then(|markup| {
                markup.tags.iter().flat_map(|tag| &tag.attributes).find(|attribute| {
                    attribute.name == crate::project::ATTRIBUTE_ID && attribute.raw_value == name
                })
            })
            .and_then(|attribute| attribute.value_span.clone())
            .unwrap_or_else(|| panic!("id={name:?} not found"));
        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: self.qualify(Some(class), name),
            kind: DefinitionKind::Variable {
                classification: VariableClassification::ClassMember,
            },
            visibility: Visibility::Public,
            containing_file: self.path(unit),
            parent: Some(class),
            name_span: Some(value_span),
        });
        self.push_member(class, def);
        def
    }

    /// A class in a precompiled library archive.
    pub fn library_class(&mut self, library: &str, package: &str, name: &str) -> DefId {
        let path = PathBuf::from(library);
        let unit = match self.units.iter().position(|unit| unit.path == path) {
            Some(index) => UnitId(index as u32),
            None => self.add_unit(library, UnitKind::Compiled, None),
        };
        let existing = match &self.units[unit.index()].scope {
            ScopeSnapshot::Ready { definitions } => definitions.iter().copied().find(|&def| {
                let def = &self.definitions[def.index()];
                def.is_package() && def.qualified_name == package
            }),
            ScopeSnapshot::Failed { .. } => None,
        };
        let package = match existing {
            Some(package) => package,
            None => {
                let def = self.add_definition(Definition {
                    name: package.to_string(),
                    qualified_name: package.to_string(),
                    kind: DefinitionKind::Package {
                        members: Vec::new(),
                    },
                    visibility: Visibility::Public,
                    containing_file: path.clone(),
                    parent: None,
                    name_span: None,
                });
                self.add_to_scope(unit, def);
                def
            }
        };
        let def = self.add_definition(Definition {
            name: name.to_string(),
            qualified_name: self.qualify(Some(package), name),
            kind: DefinitionKind::Class {
                constructor: None,
                members: Vec::new(),
            },
            visibility: Visibility::Public,
            containing_file: path,
            parent: Some(package),
            name_span: None,
        });
        self.push_member(package, def);
        def
    }

    /// A property of a library class.
    pub fn library_member(&mut self, class: DefId, name: &str) -> DefId {
        let owner = &self.definitions[class.index()];
        let definition = Definition {
            name: name.to_string(),
            qualified_name: format!("{}.{name}", owner.qualified_name),
            kind: DefinitionKind::Variable {
                classification: VariableClassification::ClassMember,
            },
            visibility: Visibility::Public,
            containing_file: owner.containing_file.clone(),
            parent: Some(class),
            name_span: None,
        };
        let def = self.add_definition(definition);
        self.push_member(class, def);
        def
    }

    /// `function` overrides `overridden`.
    pub fn overrides(&mut self, function: DefId, overridden: DefId) {
        if let DefinitionKind::Function { is_override, .. } = &mut self.definition_mut(function).kind {
            *is_override = true;
        }
        self.overrides.push(OverrideLink {
            function,
            overrides: overridden,
        });
    }

    // Markup

    /// The `nth` tag with local name `local`.
    pub fn tag(&self, unit: UnitId, local: &str, nth: usize) -> TagId {
        self.units[unit.index()]
            .markup
            .as_ref()
            .and_then(|markup| {
                markup
                    .tags
                    .iter()
                    .enumerate()
                    .filter(|(_, tag)| tag.name.local == local)
                    .nth(nth)
            })
            .map(|(index, _)| TagId(index as u32))
            .unwrap_or_else(|| panic!("tag {local} #{nth} not found"))
    }

    pub fn bind_tag(&mut self, unit: UnitId, tag: TagId, definition: DefId) {
        self.tag_bindings.push(TagBinding {
            unit,
            tag,
            attribute: None,
            definition,
        });
    }

    pub fn bind_attribute(&mut self, unit: UnitId, tag: TagId, attribute: usize, definition: DefId) {
        self.tag_bindings.push(TagBinding {
            unit,
            tag,
            attribute: Some(attribute),
            definition,
        });
    }

    // Documentation

    /// Parse the `nth` `/** ... */` comment of the unit.
    pub fn doc_comment(&mut self, unit: UnitId, nth: usize) {
        let text = self.text(unit);
        let start = text
            .match_indices("/**")
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap_or_else(|| panic!("doc comment #{nth} not found"));
        let end = text[start..]
            .find("*/")
            .map_or(text.len(), |i| start + i + 2);
        let lines = LineIndex::new(text);
        let comment = DocComment {
            span: start..end,
            tags: scan_doc_tags(text, start..end, &lines),
        };
        self.units[unit.index()].doc_comments.push(comment);
    }
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// The `nth` occurrence of `needle` inside `within` not glued to surrounding
/// word characters.
fn find_word(text: &str, needle: &str, within: Span, nth: usize) -> Option<Span> {
    let bytes = text.as_bytes();
    let needle_bytes = needle.as_bytes();
    let starts_word = needle_bytes.first().copied().is_some_and(is_word_byte);
    let ends_word = needle_bytes.last().copied().is_some_and(is_word_byte);
    text.get(within.clone())?
        .match_indices(needle)
        .map(|(i, _)| within.start + i)
        .filter(|&start| {
            let end = start + needle.len();
            let clear_before = !starts_word || start == 0 || !is_word_byte(bytes[start - 1]);
            let clear_after = !ends_word || end == bytes.len() || !is_word_byte(bytes[end]);
            clear_before && clear_after
        })
        .nth(nth)
        .map(|start| start..start + needle.len())
}

/// End of the `{ ... }` block that opens after `from`, or `from` when there is
/// none.
fn block_end(text: &str, from: usize) -> usize {
    let Some(open) = text[from..].find('{').map(|i| from + i) else {
        return from;
    };
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}

fn scan_doc_tags(text: &str, span: Span, lines: &LineIndex) -> Vec<DocTag> {
    let mut tags = Vec::new();
    for (at, _) in text[span.clone()].match_indices('@') {
        let at = span.start + at;
        let after_marker = at == 0 || matches!(text.as_bytes()[at - 1], b' ' | b'\t' | b'*');
        let name_len = text[at + 1..]
            .bytes()
            .take_while(|&b| b.is_ascii_alphanumeric())
            .count();
        if !after_marker || name_len == 0 {
            continue;
        }
        let name_end = at + 1 + name_len;
        let line_end = text[name_end..]
            .find('\n')
            .map_or(text.len(), |i| name_end + i)
            .min(span.end);
        let mut description = &text[name_end..line_end];
        if let Some(close) = description.find("*/") {
            description = &description[..close];
        }
        let description = description.trim_end();
        let (Some(start), Some(end)) = (
            lines.position(at),
            lines.position(name_end + description.len()),
        ) else {
            continue;
        };
        tags.push(DocTag {
            name: text[at + 1..name_end].to_string(),
            description: description.to_string(),
            line: start.line,
            column: start.character,
            end_line: end.line,
            end_column: end.character,
        });
    }
    tags
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b':' | b'.' | b'-')
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Skip past `terminator`, or to the end of the text.
fn skip_past(text: &str, from: usize, terminator: &str) -> usize {
    text[from..]
        .find(terminator)
        .map_or(text.len(), |i| from + i + terminator.len())
}

/// A minimal MXML scanner: elements, attributes, script bodies and `{}`
/// bindings. Comments, processing instructions and declarations are skipped.
fn scan_markup(path: PathBuf, text: &str) -> MarkupDocument {
    let bytes = text.as_bytes();
    let mut tags: Vec<MarkupTag> = Vec::new();
    let mut open: Vec<TagId> = Vec::new();
    let mut root = None;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let start = pos + offset;
        let rest = &text[start..];
        if rest.starts_with("<!--") {
            pos = skip_past(text, start, "-->");
            continue;
        }
        if rest.starts_with("<![CDATA[") {
            pos = skip_past(text, start, "]]>");
            continue;
        }
        if rest.starts_with("<?") || rest.starts_with("<!") {
            pos = skip_past(text, start, ">");
            continue;
        }

        if rest.starts_with("</") {
            let name_start = start + 2;
            let mut name_end = name_start;
            while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                name_end += 1;
            }
            let end = skip_past(text, name_end, ">");
            if let Some(id) = open.pop() {
                let tag = &mut tags[id.index()];
                tag.close_name_span = Some(name_start..name_end);
                tag.span.end = end;
            }
            pos = end;
            continue;
        }

        let name_start = start + 1;
        let mut name_end = name_start;
        while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
            name_end += 1;
        }
        let qualified = &text[name_start..name_end];
        let name = match qualified.split_once(':') {
            Some((prefix, local)) => XmlName {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => XmlName {
                prefix: None,
                local: qualified.to_string(),
            },
        };
        let role = match name.local.as_str() {
            "Script" => TagRole::Script,
            "Style" => TagRole::Style,
            _ => TagRole::Component,
        };

        let mut attributes = Vec::new();
        let mut script_regions = Vec::new();
        let mut cursor = name_end;
        let (end, self_closing) = loop {
            cursor = skip_whitespace(bytes, cursor);
            if cursor >= bytes.len() {
                break (bytes.len(), true);
            }
            if text[cursor..].starts_with("/>") {
                break (cursor + 2, true);
            }
            if bytes[cursor] == b'>' {
                break (cursor + 1, false);
            }
            let attribute_start = cursor;
            while cursor < bytes.len()
                && !bytes[cursor].is_ascii_whitespace()
                && !matches!(bytes[cursor], b'=' | b'/' | b'>')
            {
                cursor += 1;
            }
            if cursor == attribute_start {
                cursor += 1;
                continue;
            }
            let name_span = attribute_start..cursor;
            let mut value_span = None;
            let mut raw_value = String::new();
            let after_name = skip_whitespace(bytes, cursor);
            if bytes.get(after_name) == Some(&b'=') {
                let quote_at = skip_whitespace(bytes, after_name + 1);
                if let Some(&quote) = bytes.get(quote_at).filter(|&&b| b == b'"' || b == b'\'') {
                    let value_start = quote_at + 1;
                    let value_end = text[value_start..]
                        .find(quote as char)
                        .map_or(text.len(), |i| value_start + i);
                    raw_value = text[value_start..value_end].to_string();
                    script_regions.extend(binding_regions(&raw_value, value_start));
                    value_span = Some(value_start..value_end);
                    cursor = (value_end + 1).min(bytes.len());
                } else {
                    cursor = quote_at;
                }
            }
            attributes.push(MarkupAttribute {
                name: text[name_span.clone()].to_string(),
                name_span,
                value_span,
                raw_value,
            });
        };

        let id = TagId(tags.len() as u32);
        let parent = open.last().copied();
        match parent {
            Some(parent) => tags[parent.index()].children.push(id),
            None => {
                root.get_or_insert(id);
            }
        }
        pos = end;
        if !self_closing {
            open.push(id);
            let body_end = text[end..].find("</").map_or(text.len(), |i| end + i);
            match role {
                TagRole::Script => {
                    let body = &text[end..body_end];
                    let region = match body.find("<![CDATA[") {
                        Some(i) => {
                            let inner = end + i + "<![CDATA[".len();
                            let inner_end = text[inner..].find("]]>").map_or(text.len(), |j| inner + j);
                            inner..inner_end
                        }
                        None => end..body_end,
                    };
                    let resume = text[region.end..]
                        .find("</")
                        .map_or(text.len(), |i| region.end + i);
                    script_regions.push(region);
                    pos = resume;
                }
                TagRole::Style => pos = body_end,
                TagRole::Component => {}
            }
        }
        tags.push(MarkupTag {
            name,
            role,
            span: start..end,
            open_span: start..end,
            name_span: name_start..name_end,
            close_name_span: None,
            attributes,
            script_regions,
            parent,
            children: Vec::new(),
        });
    }

    MarkupDocument { path, tags, root }
}

/// Regions inside `{ ... }` data bindings of an attribute value.
fn binding_regions(value: &str, value_start: usize) -> Vec<Span> {
    let mut regions = Vec::new();
    let mut from = 0;
    while let Some(open) = value[from..].find('{').map(|i| from + i) {
        let Some(close) = value[open..].find('}').map(|i| open + i) else {
            break;
        };
        regions.push(value_start + open + 1..value_start + close);
        from = close + 1;
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    #[test]
    fn whole_word_search() {
        let text = "var count; var counter; count++";
        assert_eq!(find_word(text, "count", 0..text.len(), 0), Some(4..9));
        assert_eq!(find_word(text, "count", 0..text.len(), 1), Some(24..29));
        assert_eq!(find_word(text, "count", 0..text.len(), 2), None);
        assert_eq!(find_word(text, "count", 10..text.len(), 0), Some(24..29));
    }

    #[test]
    fn blocks_are_brace_matched() {
        let text = "class A { function f() { } } tail";
        assert_eq!(block_end(text, 7), 28);
        assert_eq!(block_end("var x;", 0), 0);
    }

    #[test]
    fn nodes_are_parented_by_span() {
        let mut b = SnapshotBuilder::new();
        let unit = b.script("/src/A.as", "package {\nclass A {\nfunction f() {\nvar x;\n}\n}\n}\n");
        let pkg = b.package(unit, "");
        let a = b.class(unit, Some(pkg), "A");
        let f = b.method(unit, a, "f");
        let x = b.local(unit, f, "x");
        let model = b.build();

        let root = model.ast(unit).unwrap();
        let class_decl = model.node(root).unwrap().children[0];
        assert!(model.node(class_decl).unwrap().class_parts().is_some());
        let method_decl = model.node(class_decl).unwrap().children[1];
        let name = model.node(method_decl).unwrap().declared_name().unwrap();
        assert_eq!(model.resolve_node(name), Some(f));
        assert_eq!(model.definition(x).unwrap().qualified_name, "A.f.x");
        assert!(model.definition(x).unwrap().is_local());
    }

    #[test]
    fn scans_markup_tags() {
        let text = "<?xml version=\"1.0\"?>\n<s:App xmlns:s=\"x\">\n<!-- <s:Ignored/> -->\n\
                    <fx:Script><![CDATA[ if (a < b) {} ]]></fx:Script>\n\
                    <s:Label text=\"{title}\"/>\n</s:App>";
        let document = scan_markup(PathBuf::from("/src/App.mxml"), text);
        let names: Vec<&str> = document.tags.iter().map(|t| t.name.local.as_str()).collect();
        assert_eq!(names, vec!["App", "Script", "Label"]);

        let (_, app) = document.root_tag().unwrap();
        assert_eq!(app.children, vec![TagId(1), TagId(2)]);
        assert_eq!(app.span.end, text.len());
        assert_eq!(&text[app.close_name_span.clone().unwrap()], "s:App");

        let script = &document.tags[1];
        assert_eq!(script.role, TagRole::Script);
        assert_eq!(&text[script.script_regions[0].clone()], " if (a < b) {} ");

        let label = &document.tags[2];
        assert_eq!(label.attributes[0].raw_value, "{title}");
        assert_eq!(&text[label.script_regions[0].clone()], "title");
        assert_eq!(label.span, label.open_span);
    }

    #[test]
    fn doc_tags_have_positions() {
        let mut b = SnapshotBuilder::new();
        let unit = b.script("/src/A.as", "/**\n * Draws.\n * @see Shape#draw() */\nvar a;");
        b.doc_comment(unit, 0);
        let model = b.build();
        let tags = &model.doc_comments(unit)[0].tags;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "see");
        assert_eq!(tags[0].description, " Shape#draw()");
        assert_eq!((tags[0].line, tags[0].column), (2, 3));
        assert_eq!((tags[0].end_line, tags[0].end_column), (2, 20));
    }
}
