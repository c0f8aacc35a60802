//! Ambient tenant + provenance context (§4.1).
//!
//! No module-level mutable state for "current project" or "current user" —
//! every repository and adapter call takes a `TenantScope` explicitly so
//! parallel tenants and parallel workflow tasks never share identity.

use schema_types::ids::ProjectId;
use schema_types::provenance::Provenance;

/// A handle binding every repository and adapter call to one project's
/// row-visibility predicate, plus the provenance of the acting request.
///
/// Cheap to clone: workflow tasks capture their own `TenantScope` when
/// spawned so cancellation and row-visibility stay scoped per task.
#[derive(Debug, Clone)]
pub struct TenantScope {
    project_id: ProjectId,
    provenance: Provenance,
}

impl TenantScope {
    pub fn new(project_id: ProjectId, provenance: Provenance) -> Self {
        Self {
            project_id,
            provenance,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// A scope for the same project acting on behalf of a different
    /// provenance — used when a task enqueued under one actor needs to
    /// record writes under a different stamp (e.g. the workflow runner
    /// stamping `source = inferred` regardless of who started the workflow).
    pub fn with_provenance(&self, provenance: Provenance) -> Self {
        Self {
            project_id: self.project_id,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_types::provenance::ProvenanceSource;

    #[test]
    fn with_provenance_keeps_project_but_swaps_stamp() {
        let scope = TenantScope::new(ProjectId::new(), Provenance::manual("alice"));
        let system_scope = scope.with_provenance(Provenance::inferred("system"));
        assert_eq!(scope.project_id(), system_scope.project_id());
        assert_eq!(system_scope.provenance().source, ProvenanceSource::Inferred);
    }
}
