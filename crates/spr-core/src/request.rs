//! Registration requests and passes

use serde::{Deserialize, Serialize};
use spr_model::{AnnotationRef, Capability, Declaration, Entry, ImplementationId, Position};
use std::collections::BTreeSet;

/// Annotation assumed when a request does not name one
pub const DEFAULT_ANNOTATION: &str = "ServiceProvider";

fn default_annotation() -> AnnotationRef {
    AnnotationRef::new(DEFAULT_ANNOTATION)
}

/// One "register `declaration` under `capability`" request
///
/// Serialized with the position as an optional integer:
///
/// ```json
/// {
///   "declaration": { "id": "org.acme.Fast", "visibility": "public", "assignable_to": ["org.acme.Codec"] },
///   "capability": "org.acme.Codec",
///   "position": 10,
///   "supersedes": ["org.acme.Default"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Candidate implementation
    pub declaration: Declaration,

    /// Annotation that triggered the request (diagnostic context)
    #[serde(default = "default_annotation")]
    pub annotation: AnnotationRef,

    /// Capability the candidate is registered under
    pub capability: Capability,

    /// Resource group; empty selects the default group
    #[serde(default)]
    pub group: String,

    /// Explicit rank
    #[serde(default, with = "rank")]
    pub position: Position,

    /// Identifiers this registration overrides
    #[serde(default)]
    pub supersedes: BTreeSet<ImplementationId>,
}

impl RegistrationRequest {
    /// Create unranked default-group request
    #[must_use]
    pub fn new(declaration: Declaration, capability: Capability) -> Self {
        Self {
            declaration,
            annotation: default_annotation(),
            capability,
            group: String::new(),
            position: Position::Unranked,
            supersedes: BTreeSet::new(),
        }
    }

    /// With annotation
    #[inline]
    #[must_use]
    pub fn with_annotation(mut self, annotation: AnnotationRef) -> Self {
        self.annotation = annotation;
        self
    }

    /// With resource group
    #[inline]
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// With rank
    #[inline]
    #[must_use]
    pub fn at_position(mut self, rank: i32) -> Self {
        self.position = Position::Ranked(rank);
        self
    }

    /// Add a superseded identifier
    #[inline]
    #[must_use]
    pub fn superseding(mut self, id: ImplementationId) -> Self {
        self.supersedes.insert(id);
        self
    }

    /// Entry this request contributes
    #[must_use]
    pub fn entry(&self) -> Entry {
        Entry::new(self.declaration.id.clone())
            .with_position(self.position)
            .with_supersedes(self.supersedes.iter().cloned())
    }
}

/// One unit of host build work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pass {
    /// Registrations discovered in this pass
    pub requests: Vec<RegistrationRequest>,
    /// The host reported errors; the pass is skipped
    pub error_raised: bool,
    /// Terminal pass; the channel is finalized afterwards
    pub processing_over: bool,
}

impl Pass {
    /// Create empty intermediate pass
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create terminal pass
    #[inline]
    #[must_use]
    pub fn terminal() -> Self {
        Self {
            processing_over: true,
            ..Self::default()
        }
    }

    /// With a request
    #[inline]
    #[must_use]
    pub fn with_request(mut self, request: RegistrationRequest) -> Self {
        self.requests.push(request);
        self
    }

    /// Mark the pass as having host errors
    #[inline]
    #[must_use]
    pub fn with_error_raised(mut self) -> Self {
        self.error_raised = true;
        self
    }
}

impl FromIterator<RegistrationRequest> for Pass {
    fn from_iter<I: IntoIterator<Item = RegistrationRequest>>(iter: I) -> Self {
        Self {
            requests: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// `Position` as `Option<i32>` on the wire
mod rank {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use spr_model::Position;

    pub(super) fn serialize<S: Serializer>(position: &Position, serializer: S) -> Result<S::Ok, S::Error> {
        position.rank().serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Position, D::Error> {
        Option::<i32>::deserialize(deserializer).map(Position::from_rank)
    }
}
