//! Build manifests
//!
//! A manifest lists the declarations a build knows about and the passes that
//! register them. Requests name their implementation by identifier:
//!
//! ```json
//! {
//!   "declarations": [
//!     { "id": "org.acme.Fast", "visibility": "public", "assignable_to": ["org.acme.Codec"] }
//!   ],
//!   "passes": [
//!     { "requests": [ { "implementation": "org.acme.Fast", "capability": "org.acme.Codec", "position": 10 } ] }
//!   ]
//! }
//! ```
//!
//! Listed passes are intermediate; `spr build` sends the terminal pass after
//! the last of them.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use spr_core::{Pass, RegistrationRequest, DEFAULT_ANNOTATION};
use spr_model::{AnnotationRef, Capability, Declaration, ImplementationId, Position};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
pub(crate) struct Manifest {
    #[serde(default)]
    declarations: Vec<Declaration>,
    #[serde(default)]
    passes: Vec<ManifestPass>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestPass {
    requests: Vec<ManifestRequest>,
    error_raised: bool,
}

#[derive(Debug, Deserialize)]
struct ManifestRequest {
    implementation: ImplementationId,
    capability: Capability,
    #[serde(default)]
    annotation: Option<AnnotationRef>,
    #[serde(default)]
    group: String,
    #[serde(default)]
    position: Option<i32>,
    #[serde(default)]
    supersedes: BTreeSet<ImplementationId>,
}

impl Manifest {
    /// Read and parse a manifest file
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    /// Resolve every request against the declared implementations
    pub(crate) fn passes(&self) -> Result<Vec<Pass>> {
        let mut declarations = HashMap::with_capacity(self.declarations.len());
        for declaration in &self.declarations {
            if declarations.insert(declaration.id.clone(), declaration).is_some() {
                bail!("declaration {} is listed twice", declaration.id);
            }
        }

        self.passes
            .iter()
            .enumerate()
            .map(|(index, pass)| -> Result<Pass> {
                let requests = pass
                    .requests
                    .iter()
                    .map(|request| -> Result<RegistrationRequest> {
                        let declaration = declarations.get(&request.implementation).with_context(|| {
                            format!(
                                "pass {}: unknown implementation {}",
                                index + 1,
                                request.implementation
                            )
                        })?;
                        Ok(request.resolve(declaration))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Pass {
                    requests,
                    error_raised: pass.error_raised,
                    processing_over: false,
                })
            })
            .collect()
    }
}

impl ManifestRequest {
    fn resolve(&self, declaration: &Declaration) -> RegistrationRequest {
        RegistrationRequest {
            declaration: declaration.clone(),
            annotation: self
                .annotation
                .clone()
                .unwrap_or_else(|| AnnotationRef::new(DEFAULT_ANNOTATION)),
            capability: self.capability.clone(),
            group: self.group.clone(),
            position: Position::from_rank(self.position),
            supersedes: self.supersedes.clone(),
        }
    }
}
