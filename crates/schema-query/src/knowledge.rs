//! Knowledge seed parsing (§4.9, §6). Pure parse — no filesystem I/O; the
//! actual file read is the external loader's job. `KnowledgeRepository::
//! upsert_fact` is idempotent on `(project, fact_type, key)`, so callers may
//! re-run a seed file safely.

use serde::Deserialize;

use schema_core::error::{Result, SchemaIntelError};
use schema_types::enums::FactType;
use schema_types::knowledge::KnowledgeFactInput;

#[derive(Debug, Deserialize)]
struct SeedEntry {
    fact: String,
    context: String,
}

#[derive(Debug, Deserialize, Default)]
struct SeedFile {
    #[serde(default)]
    terminology: Vec<SeedEntry>,
    #[serde(default)]
    business_rules: Vec<SeedEntry>,
    #[serde(default)]
    conventions: Vec<SeedEntry>,
}

pub fn parse_seed_yaml(raw: &str) -> Result<Vec<KnowledgeFactInput>> {
    let parsed: SeedFile = serde_yaml::from_str(raw)
        .map_err(|e| SchemaIntelError::ParseError(format!("knowledge seed: {e}")))?;

    let mut facts = Vec::with_capacity(parsed.terminology.len() + parsed.business_rules.len() + parsed.conventions.len());
    facts.extend(parsed.terminology.into_iter().map(|e| into_fact(FactType::Terminology, e)));
    facts.extend(parsed.business_rules.into_iter().map(|e| into_fact(FactType::BusinessRule, e)));
    facts.extend(parsed.conventions.into_iter().map(|e| into_fact(FactType::Convention, e)));
    Ok(facts)
}

fn into_fact(fact_type: FactType, entry: SeedEntry) -> KnowledgeFactInput {
    KnowledgeFactInput {
        fact_type,
        key: entry.fact,
        context: entry.context,
    }
}
