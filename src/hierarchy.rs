//! Agency hierarchy ingestion.
//!
//! Walks the agency forest depth-first, upserting one agency row per slug
//! and recording the traversal parent, then resolves each node's title
//! cross-references against the already-ingested titles table into the
//! `title_agency` association. Links belong to the referencing agency only;
//! they are never propagated to ancestors or descendants.
//!
//! The whole walk is idempotent: unique-slug and unique-pair constraints
//! plus insert-if-absent semantics make re-runs produce the same row sets.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::AgencyNode;

/// Outcome counters for one hierarchy build.
#[derive(Debug, Default, Clone, Copy)]
pub struct HierarchyReport {
    pub agencies_upserted: u64,
    pub links_created: u64,
    /// Cross-references to unknown title numbers, skipped with a warning.
    pub dropped_refs: u64,
    /// Nodes without a slug, skipped with a warning.
    pub skipped_nodes: u64,
}

/// Builds the agency hierarchy and title associations from a catalog forest.
pub async fn build_hierarchy(pool: &SqlitePool, forest: &[AgencyNode]) -> Result<HierarchyReport> {
    let mut report = HierarchyReport::default();

    // Explicit stack instead of async recursion; children are pushed in
    // reverse so traversal stays depth-first, left-to-right.
    let mut stack: Vec<(&AgencyNode, Option<i64>)> =
        forest.iter().rev().map(|n| (n, None)).collect();

    while let Some((node, parent_id)) = stack.pop() {
        let Some(slug) = node.slug.as_deref().filter(|s| !s.is_empty()) else {
            eprintln!("Warning: skipping agency '{}': missing slug", node.name);
            report.skipped_nodes += 1;
            // Children are re-parented to the skipped node's parent so a
            // malformed inner node does not drop its whole subtree.
            for child in node.children.iter().rev() {
                stack.push((child, parent_id));
            }
            continue;
        };

        let agency_id = upsert_agency(pool, node, slug, parent_id).await?;
        report.agencies_upserted += 1;

        for reference in &node.cfr_references {
            let title_id: Option<i64> = sqlx::query_scalar("SELECT id FROM titles WHERE number = ?")
                .bind(reference.title)
                .fetch_optional(pool)
                .await?;

            match title_id {
                Some(title_id) => {
                    let result = sqlx::query(
                        "INSERT OR IGNORE INTO title_agency (title_id, agency_id) VALUES (?, ?)",
                    )
                    .bind(title_id)
                    .bind(agency_id)
                    .execute(pool)
                    .await?;
                    report.links_created += result.rows_affected();
                }
                None => {
                    eprintln!(
                        "Warning: agency '{}' references unknown title {}",
                        slug, reference.title
                    );
                    report.dropped_refs += 1;
                }
            }
        }

        for child in node.children.iter().rev() {
            stack.push((child, Some(agency_id)));
        }
    }

    Ok(report)
}

async fn upsert_agency(
    pool: &SqlitePool,
    node: &AgencyNode,
    slug: &str,
    parent_id: Option<i64>,
) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO agencies (name, short_name, slug, parent_id)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(slug) DO UPDATE SET
            name = excluded.name,
            short_name = excluded.short_name,
            parent_id = excluded.parent_id
        "#,
    )
    .bind(&node.name)
    .bind(&node.short_name)
    .bind(slug)
    .bind(parent_id)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM agencies WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(id)
}
