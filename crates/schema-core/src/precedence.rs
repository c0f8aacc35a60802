//! Precedence checker (§4.8).
//!
//! Pure function over `(element.created_by, element.updated_by,
//! modifier.source)`. Every mutator of ontology elements must consult this
//! before writing. Glossary terms use an isomorphic checker over the term's
//! own stored `source` field — kept as a second, separate function rather
//! than one generic one, matching the spec's explicit "separate but
//! isomorphic" framing.

use schema_types::provenance::ProvenanceSource;

/// `effective_source = updated_by if set else created_by`. A modifier may
/// write only if its level is `>=` the element's effective level.
pub fn can_write_entity(
    modifier: ProvenanceSource,
    created_by: ProvenanceSource,
    updated_by: Option<ProvenanceSource>,
) -> bool {
    let effective = updated_by.unwrap_or(created_by);
    modifier.level() >= effective.level()
}

/// Same precedence rule applied to a glossary term's single stored `source`
/// field (terms have no separate created/updated provenance split).
pub fn can_write_glossary_term(modifier: ProvenanceSource, term_source: ProvenanceSource) -> bool {
    modifier.level() >= term_source.level()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProvenanceSource::*;

    #[test]
    fn manual_beats_everything() {
        assert!(can_write_entity(Manual, Inferred, None));
        assert!(can_write_entity(Manual, Mcp, Some(Mcp)));
        assert!(can_write_entity(Manual, Manual, Some(Manual)));
    }

    #[test]
    fn inferred_cannot_override_manual() {
        assert!(!can_write_entity(Inferred, Manual, None));
        assert!(!can_write_entity(Mcp, Manual, Some(Manual)));
    }

    #[test]
    fn effective_source_prefers_updated_by_over_created_by() {
        // created manually, later updated by mcp: an inferred write must
        // now be measured against mcp (level 2), not manual (level 3).
        assert!(!can_write_entity(Inferred, Manual, Some(Mcp)));
        assert!(can_write_entity(Mcp, Manual, Some(Mcp)));
    }

    #[test]
    fn equal_level_may_overwrite() {
        assert!(can_write_entity(Mcp, Mcp, None));
    }

    #[test]
    fn glossary_term_checker_is_isomorphic() {
        assert!(can_write_glossary_term(Manual, Inferred));
        assert!(!can_write_glossary_term(Inferred, Manual));
        assert!(can_write_glossary_term(Mcp, Mcp));
    }
}
