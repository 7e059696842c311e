//! Resolving syntax nodes to the definitions they refer to.

use crate::project::{DefId, Keyword, NodeId, Project};

use super::scope::package_or_definition;

/// A secondary strategy for identifiers the compiler's own resolution misses.
pub trait FallbackResolver: Send + Sync {
    fn resolve(&self, project: &dyn Project, node: NodeId) -> Option<DefId>;
}

/// Resolves identifiers that qualify a member access, such as the `events`
/// in `flash.events.Event`, by looking up the dotted name they end as a
/// package or package-level definition.
#[derive(Debug, Default, Clone, Copy)]
pub struct QualifierFallback;

impl FallbackResolver for QualifierFallback {
    fn resolve(&self, project: &dyn Project, node: NodeId) -> Option<DefId> {
        project.node(node)?.as_identifier()?;
        let parent_id = project.node(node)?.parent?;
        let (left, right) = project.node(parent_id)?.member_access()?;
        let qualifier = if right == node {
            dotted_name(project, parent_id)?
        } else if left == node {
            dotted_name(project, node)?
        } else {
            return None;
        };
        package_or_definition(project, &qualifier)
    }
}

/// `a.b.c` for a chain of identifiers joined by member access.
fn dotted_name(project: &dyn Project, node: NodeId) -> Option<String> {
    let node = project.node(node)?;
    if let Some(name) = node.as_identifier() {
        return Some(name.to_string());
    }
    let (left, right) = node.member_access()?;
    Some(format!(
        "{}.{}",
        dotted_name(project, left)?,
        dotted_name(project, right)?
    ))
}

/// Identifier resolution: the compiler first, then each fallback in order.
pub struct Resolver {
    fallbacks: Vec<Box<dyn FallbackResolver>>,
}

impl Resolver {
    /// Compiler resolution plus the built-in fallbacks.
    pub fn standard() -> Self {
        Self::with_fallbacks(vec![Box::new(QualifierFallback)])
    }

    /// Compiler resolution only.
    pub fn compiler_only() -> Self {
        Self::with_fallbacks(Vec::new())
    }

    pub fn with_fallbacks(fallbacks: Vec<Box<dyn FallbackResolver>>) -> Self {
        Self { fallbacks }
    }

    pub fn resolve_identifier(&self, project: &dyn Project, node: NodeId) -> Option<DefId> {
        project.resolve_node(node).or_else(|| {
            self.fallbacks
                .iter()
                .find_map(|fallback| fallback.resolve(project, node))
        })
    }

    /// The definition a node refers to, for navigation.
    ///
    /// Identifiers resolve through scope lookup; `this` and `super` resolve to
    /// the enclosing class and its base class. A class named in a `new`
    /// expression resolves to its constructor when it declares one.
    pub fn resolve_for_navigation(&self, project: &dyn Project, node_id: NodeId) -> Option<DefId> {
        let node = project.node(node_id)?;
        let mut definition = None;
        if node.as_identifier().is_some() {
            definition = self.resolve_identifier(project, node_id);
        }
        if definition.is_none() {
            if let Some(keyword) = node.keyword() {
                definition = resolve_keyword(project, node_id, keyword);
            }
        }
        let definition = definition?;
        Some(prefer_constructor(project, node_id, definition))
    }

    /// The definition a node declares or refers to, for rename.
    pub fn resolve_for_rename(&self, project: &dyn Project, node_id: NodeId) -> Option<DefId> {
        let node = project.node(node_id)?;
        if let Some(name) = node.declared_name() {
            return project.resolve_node(name);
        }
        if node.as_identifier().is_some() {
            return self.resolve_identifier(project, node_id);
        }
        None
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::standard()
    }
}

fn resolve_keyword(project: &dyn Project, node: NodeId, keyword: Keyword) -> Option<DefId> {
    let class = enclosing_class(project, node)?;
    let (name, base) = project.node(class)?.class_parts()?;
    match keyword {
        Keyword::This => project.resolve_node(name),
        Keyword::Super => project.resolve_node(base?),
        Keyword::Other => None,
    }
}

fn enclosing_class(project: &dyn Project, node: NodeId) -> Option<NodeId> {
    let mut current = project.node(node)?.parent;
    while let Some(id) = current {
        let ancestor = project.node(id)?;
        if ancestor.class_parts().is_some() {
            return Some(id);
        }
        current = ancestor.parent;
    }
    None
}

fn prefer_constructor(project: &dyn Project, node: NodeId, definition: DefId) -> DefId {
    let in_new_expression = project
        .node(node)
        .and_then(|n| n.parent)
        .and_then(|parent| project.node(parent))
        .is_some_and(|parent| parent.is_new_call());
    if !in_new_expression {
        return definition;
    }
    project
        .definition(definition)
        .filter(|def| def.is_class())
        .and_then(|def| def.constructor())
        .unwrap_or(definition)
}

/// Follow overrides up to the declaration that introduced the function.
pub fn base_declaration(project: &dyn Project, definition: DefId) -> DefId {
    let mut current = definition;
    // Bounded so that a malformed override cycle cannot hang the request.
    for _ in 0..64 {
        let is_override = project
            .definition(current)
            .is_some_and(|def| def.is_override());
        if !is_override {
            break;
        }
        match project.overridden_function(current) {
            Some(overridden) if overridden != current => current = overridden,
            _ => break,
        }
    }
    current
}
