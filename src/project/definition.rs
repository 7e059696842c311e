//! Semantic definitions as exposed by the compiler.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DefId, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableClassification {
    Local,
    Parameter,
    ClassMember,
    InterfaceMember,
    PackageMember,
    FileMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionClassification {
    Local,
    ClassMember,
    InterfaceMember,
    PackageMember,
    FileMember,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionKind {
    Package {
        #[serde(default)]
        members: Vec<DefId>,
    },
    Class {
        #[serde(default)]
        constructor: Option<DefId>,
        #[serde(default)]
        members: Vec<DefId>,
    },
    Interface {
        #[serde(default)]
        members: Vec<DefId>,
    },
    Function {
        classification: FunctionClassification,
        #[serde(default)]
        is_override: bool,
    },
    Variable {
        classification: VariableClassification,
    },
}

/// A class, interface, function, variable or package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Simple name, e.g. `Button`.
    pub name: String,
    /// Fully qualified name, e.g. `spark.components.Button`.
    pub qualified_name: String,
    #[serde(flatten)]
    pub kind: DefinitionKind,
    #[serde(default)]
    pub visibility: Visibility,
    /// Source file, or library archive, that declares this definition.
    pub containing_file: PathBuf,
    #[serde(default)]
    pub parent: Option<DefId>,
    /// Span of the declared name in `containing_file`.
    #[serde(default)]
    pub name_span: Option<Span>,
}

impl Definition {
    pub fn is_package(&self) -> bool {
        matches!(self.kind, DefinitionKind::Package { .. })
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DefinitionKind::Class { .. })
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            DefinitionKind::Class { .. } | DefinitionKind::Interface { .. }
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, DefinitionKind::Function { .. })
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, DefinitionKind::Variable { .. })
    }

    pub fn is_override(&self) -> bool {
        matches!(
            self.kind,
            DefinitionKind::Function {
                is_override: true,
                ..
            }
        )
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// Local variables and local functions are only visible inside their unit.
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind,
            DefinitionKind::Variable {
                classification: VariableClassification::Local,
            } | DefinitionKind::Function {
                classification: FunctionClassification::Local,
                ..
            }
        )
    }

    pub fn constructor(&self) -> Option<DefId> {
        match self.kind {
            DefinitionKind::Class { constructor, .. } => constructor,
            _ => None,
        }
    }

    /// Locally declared members of a type or package.
    pub fn members(&self) -> &[DefId] {
        match &self.kind {
            DefinitionKind::Package { members }
            | DefinitionKind::Class { members, .. }
            | DefinitionKind::Interface { members } => members,
            _ => &[],
        }
    }
}
