//! Pure prompt rendering for relationship adjudication (§4.4).

use schema_types::ontology::RelationshipCandidate;
use schema_types::schema::{SchemaColumn, SchemaTable};

/// Minimal per-table context handed to the model: name, row count, and each
/// column's type/flags plus a "looks like FK" hint derived from naming and
/// statistics already computed by the discovery pipeline.
pub struct TableContext<'a> {
    pub table: &'a SchemaTable,
    pub columns: &'a [SchemaColumn],
}

/// Renders the fixed prompt shape from §4.4: per-table context followed by
/// per-candidate context, with instructions for the strict-JSON contract.
pub fn render_prompt(tables: &[TableContext<'_>], candidates: &[RelationshipCandidate]) -> String {
    let mut out = String::new();
    out.push_str(
        "You are reviewing candidate foreign-key relationships discovered in a \
         relational schema. Respond with strict JSON matching this shape: \
         {\"decisions\":[{\"candidate_id\":string,\"action\":\"confirm\"|\"reject\"|\"needs_review\",\
         \"confidence\":number,\"reasoning\":string}],\"new_relationships\":[{\"source_table\":string,\
         \"source_column\":string,\"target_table\":string,\"target_column\":string,\
         \"cardinality\":string,\"reasoning\":string}]}. Do not include any text outside the JSON object.\n\n",
    );

    out.push_str("## Tables\n");
    for ctx in tables {
        out.push_str(&format!(
            "- {} (rows: {})\n",
            ctx.table.table_name,
            ctx.table
                .row_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".into()),
        ));
        for col in ctx.columns {
            let fk_hint = if col.column_name.ends_with("_id") || col.is_primary_key {
                " [looks like FK]"
            } else {
                ""
            };
            out.push_str(&format!(
                "    - {} {}{}{}{}\n",
                col.column_name,
                col.data_type,
                if col.is_primary_key { " PK" } else { "" },
                if col.is_nullable { " NULLABLE" } else { "" },
                fk_hint,
            ));
        }
    }

    out.push_str("\n## Candidates\n");
    for candidate in candidates {
        out.push_str(&format!(
            "- id={} detection_method={:?} confidence={:.2} cardinality={:?}\n",
            candidate.id, candidate.detection_method, candidate.confidence, candidate.cardinality,
        ));
        if let Some(rate) = candidate.metrics.match_rate {
            out.push_str(&format!("    match_rate={rate:.3}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use schema_types::enums::{Cardinality, InferenceMethod};
    use schema_types::ids::{
        DatasourceId, ProjectId, RelationshipCandidateId, SchemaColumnId, SchemaTableId, WorkflowId,
    };
    use schema_types::schema::RelationshipMetrics;

    fn table() -> SchemaTable {
        SchemaTable {
            id: SchemaTableId::new(),
            project_id: ProjectId::new(),
            datasource_id: DatasourceId::new(),
            schema_name: "public".into(),
            table_name: "orders".into(),
            row_count: Some(42),
            is_selected: true,
            business_name: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn column(name: &str, is_pk: bool) -> SchemaColumn {
        SchemaColumn {
            id: SchemaColumnId::new(),
            project_id: ProjectId::new(),
            table_id: SchemaTableId::new(),
            column_name: name.into(),
            data_type: "uuid".into(),
            is_nullable: false,
            is_primary_key: is_pk,
            ordinal_position: 1,
            is_selected: true,
            distinct_count: None,
            non_null_count: None,
            row_count_snapshot: None,
            is_joinable: None,
            joinability_reason: None,
            business_name: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn candidate() -> RelationshipCandidate {
        RelationshipCandidate {
            id: RelationshipCandidateId::new(),
            workflow_id: WorkflowId::new(),
            datasource_id: DatasourceId::new(),
            source_column_id: SchemaColumnId::new(),
            target_column_id: SchemaColumnId::new(),
            detection_method: InferenceMethod::PkMatch,
            confidence: 0.8,
            metrics: RelationshipMetrics {
                match_rate: Some(0.9),
                ..Default::default()
            },
            cardinality: Cardinality::ManyToOne,
            llm_reasoning: None,
            status: schema_types::enums::CandidateStatus::Pending,
            is_required: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_tables_and_candidates() {
        let t = table();
        let cols = vec![column("id", true), column("user_id", false)];
        let ctx = TableContext {
            table: &t,
            columns: &cols,
        };
        let cand = candidate();
        let rendered = render_prompt(&[ctx], &[cand]);
        assert!(rendered.contains("orders"));
        assert!(rendered.contains("user_id"));
        assert!(rendered.contains("looks like FK"));
        assert!(rendered.contains("match_rate=0.900"));
    }
}
