//! Queries over the file scopes of compilation units.

use crate::project::{DefId, Project, UnitId};

/// The file scope of a unit, or nothing if the compiler could not provide it.
pub(crate) fn file_scope(project: &dyn Project, unit: UnitId) -> Vec<DefId> {
    match project.file_scope(unit) {
        Ok(definitions) => definitions,
        Err(err) => {
            tracing::debug!(%err, "treating unavailable file scope as empty");
            Vec::new()
        }
    }
}

/// Definitions declared at package scope in a unit, in declaration order.
pub fn top_level_definitions(project: &dyn Project, unit: UnitId) -> Vec<DefId> {
    file_scope(project, unit)
        .into_iter()
        .filter_map(|id| project.definition(id))
        .filter(|def| def.is_package())
        .flat_map(|package| package.members().iter().copied())
        .collect()
}

/// The externally visible definition a unit is named after.
pub fn primary_definition(project: &dyn Project, unit: UnitId) -> Option<DefId> {
    top_level_definitions(project, unit)
        .into_iter()
        .find(|&id| project.definition(id).is_some_and(|def| !def.is_private()))
}

/// Look up a package-level definition by fully qualified name across all units.
pub fn definition_by_qualified_name(project: &dyn Project, qualified_name: &str) -> Option<DefId> {
    project.units().into_iter().find_map(|unit| {
        top_level_definitions(project, unit).into_iter().find(|&id| {
            project
                .definition(id)
                .is_some_and(|def| def.qualified_name == qualified_name)
        })
    })
}

/// Whether the unit's file is named after `target`.
///
/// Matches package-level definitions by identity, and classes whose
/// constructor is `target`.
pub(crate) fn is_principal_definition(project: &dyn Project, unit: UnitId, target: DefId) -> bool {
    let might_be_constructor = project.definition(target).is_some_and(|def| def.is_function());
    top_level_definitions(project, unit).into_iter().any(|id| {
        id == target
            || (might_be_constructor
                && project
                    .definition(id)
                    .is_some_and(|def| def.constructor() == Some(target)))
    })
}

/// Name of the package a unit declares. The unnamed package has none.
pub(crate) fn unit_package(project: &dyn Project, unit: UnitId) -> Option<String> {
    file_scope(project, unit)
        .into_iter()
        .filter_map(|id| project.definition(id))
        .find(|def| def.is_package())
        .map(|package| package.qualified_name.clone())
        .filter(|name| !name.is_empty())
}

/// A package-level definition, or a package itself, by qualified name.
pub(crate) fn package_or_definition(project: &dyn Project, qualified_name: &str) -> Option<DefId> {
    definition_by_qualified_name(project, qualified_name).or_else(|| {
        project.units().into_iter().find_map(|unit| {
            file_scope(project, unit).into_iter().find(|&id| {
                project
                    .definition(id)
                    .is_some_and(|def| def.is_package() && def.qualified_name == qualified_name)
            })
        })
    })
}
