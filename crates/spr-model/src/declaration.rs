//! Declaration and capability descriptions
//!
//! The eligibility rules never inspect compiled code. The discovery layer
//! hands over a [`Declaration`]: an explicit description of the candidate's
//! kind, visibility, nesting, constructors and the capability types it is
//! assignable to.

use crate::id::ImplementationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Kind of a source declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// Concrete or abstract class
    #[default]
    Class,
    /// Interface
    Interface,
    /// Annotation type
    Annotation,
    /// Enumeration
    Enum,
    /// Record
    Record,
    /// Method, field or any other non-type member
    Member,
}

impl DeclarationKind {
    /// Lowercase name used in diagnostics
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Annotation => "annotation type",
            Self::Enum => "enum",
            Self::Record => "record",
            Self::Member => "member",
        }
    }
}

impl Display for DeclarationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access level of a declaration or constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to subclasses and the package
    Protected,
    /// Visible within the package
    #[default]
    Package,
    /// Visible within the declaring type
    Private,
}

impl Visibility {
    /// Check if publicly visible
    #[inline]
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Where a declaration sits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Nesting {
    /// Declared directly in a package
    #[default]
    TopLevel,
    /// Declared inside another type
    Nested {
        /// Enclosing declaration
        enclosing: ImplementationId,
        /// `false` when instances need an enclosing instance
        #[serde(rename = "static")]
        is_static: bool,
    },
}

impl Nesting {
    /// Check if instances need an enclosing instance
    #[inline]
    #[must_use]
    pub fn requires_enclosing_instance(&self) -> bool {
        matches!(self, Self::Nested { is_static: false, .. })
    }
}

/// One constructor of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constructor {
    /// Access level
    pub visibility: Visibility,
    /// Number of parameters
    pub arity: usize,
}

impl Constructor {
    /// Public zero-argument constructor
    #[inline]
    #[must_use]
    pub fn public_no_arg() -> Self {
        Self {
            visibility: Visibility::Public,
            arity: 0,
        }
    }

    /// Check if this is a public zero-argument constructor
    #[inline]
    #[must_use]
    pub fn is_public_no_arg(&self) -> bool {
        self.visibility.is_public() && self.arity == 0
    }
}

/// Position of a declaration in its source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file, relative to the compilation root
    pub file: String,
    /// 1-based line
    pub line: u32,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Capability type an implementation is registered under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(ImplementationId);

impl Capability {
    /// Create capability from its binary name
    #[inline]
    #[must_use]
    pub fn new(name: ImplementationId) -> Self {
        Self(name)
    }

    /// Binary name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &ImplementationId {
        &self.0
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Annotation that triggered a registration (diagnostic context only)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationRef(String);

impl AnnotationRef {
    /// Create annotation reference
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Annotation name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for AnnotationRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Description of a candidate implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Binary name
    pub id: ImplementationId,
    /// Declaration kind
    #[serde(default)]
    pub kind: DeclarationKind,
    /// Access level
    #[serde(default)]
    pub visibility: Visibility,
    /// Declared abstract
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Nesting
    #[serde(default)]
    pub nesting: Nesting,
    /// Declared constructors; empty means the implicit default constructor
    /// with the declaration's own visibility
    #[serde(default)]
    pub constructors: Vec<Constructor>,
    /// Capability types this declaration is assignable to, including itself
    /// and all transitive supertypes
    #[serde(default)]
    pub assignable_to: BTreeSet<ImplementationId>,
    /// Source position
    #[serde(default)]
    pub location: SourceLocation,
}

impl Declaration {
    /// Public top-level concrete class with only the implicit constructor
    #[must_use]
    pub fn class(id: ImplementationId) -> Self {
        let assignable_to = BTreeSet::from([id.clone()]);
        Self {
            id,
            kind: DeclarationKind::Class,
            visibility: Visibility::Public,
            is_abstract: false,
            nesting: Nesting::TopLevel,
            constructors: Vec::new(),
            assignable_to,
            location: SourceLocation::default(),
        }
    }

    /// Declare assignability to a capability type
    #[inline]
    #[must_use]
    pub fn implementing(mut self, capability: &Capability) -> Self {
        self.assignable_to.insert(capability.name().clone());
        self
    }

    /// Set source location
    #[inline]
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = SourceLocation {
            file: file.into(),
            line,
        };
        self
    }

    /// Constructors, with the implicit default constructor filled in
    #[must_use]
    pub fn effective_constructors(&self) -> Vec<Constructor> {
        if self.constructors.is_empty() {
            vec![Constructor {
                visibility: self.visibility,
                arity: 0,
            }]
        } else {
            self.constructors.clone()
        }
    }

    /// Check assignability to a capability type
    #[inline]
    #[must_use]
    pub fn is_assignable_to(&self, capability: &Capability) -> bool {
        self.id == *capability.name() || self.assignable_to.contains(capability.name())
    }
}
