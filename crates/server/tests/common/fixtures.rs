//! Seed data shared by the integration tests.
//!
//! The statements are portable between SQLite and PostgreSQL.
//!
//! Gene `ENSG00000130203` (APOE) has three transcripts whose summed
//! `cpm_normalized_tmm` is T1 = 50, T2 = 50, T3 = 10 across two samples.
//! Annotation holds one row per exon; T1 and T3 have two exons each.

use isoview_store::{PostgresStore, SqliteStore};

pub const APOE_ID: &str = "ENSG00000130203";
pub const APOER2_ID: &str = "ENSG00000157193";
/// Annotated but absent from every matrix table.
pub const APOC1_ID: &str = "ENSG00000130208";

pub const SEED_STATEMENTS: &[&str] = &[
    "CREATE TABLE transcript_annotation (\
     gene_id TEXT, gene_name TEXT, transcript_id TEXT, seqnames TEXT, \
     start INTEGER, \"end\" INTEGER, strand TEXT, exon_number INTEGER)",
    "INSERT INTO transcript_annotation VALUES \
     ('ENSG00000130203', 'APOE', 'T1', 'chr19', 44905796, 44906100, '+', 1), \
     ('ENSG00000130203', 'APOE', 'T1', 'chr19', 44907800, 44909393, '+', 2), \
     ('ENSG00000130203', 'APOE', 'T2', 'chr19', 44905800, 44908000, '+', 1), \
     ('ENSG00000130203', 'APOE', 'T3', 'chr19', 44906000, 44906600, '+', 1), \
     ('ENSG00000130203', 'APOE', 'T3', 'chr19', 44908200, 44909000, '+', 2), \
     ('ENSG00000157193', 'APOER2', 'T4', 'chr1', 53242000, 53328000, '-', 1), \
     ('ENSG00000130208', 'APOC1', 'T5', 'chr19', 44911000, 44916000, '+', 1), \
     ('ENSG00000141510', 'TP53', 'T6', 'chr17', 7661779, 7687538, '-', 1)",
    "CREATE TABLE metadata (\
     sample_and_flowcell_id TEXT, diagnosis TEXT, age INTEGER, sex TEXT, \"RIN\" NUMERIC(4, 1))",
    "INSERT INTO metadata VALUES \
     ('S1', 'AD', 84, 'F', 7.5), \
     ('S2', 'CT', 79, 'M', NULL)",
    "CREATE TABLE total_transcript_data (\
     sample_id TEXT, gene_id TEXT, transcript_id TEXT, counts INTEGER, \
     cpm_normalized_tmm DOUBLE PRECISION, relative_abundance DOUBLE PRECISION)",
    "INSERT INTO total_transcript_data VALUES \
     ('S1', 'ENSG00000130203', 'T1', 30, 25.0, 40.0), \
     ('S2', 'ENSG00000130203', 'T1', 20, 25.0, 45.0), \
     ('S1', 'ENSG00000130203', 'T2', 40, 30.0, 50.0), \
     ('S2', 'ENSG00000130203', 'T2', 10, 20.0, 35.0), \
     ('S1', 'ENSG00000130203', 'T3', 5, 4.0, 10.0), \
     ('S2', 'ENSG00000130203', 'T3', 5, 6.0, 20.0), \
     ('S1', 'ENSG00000157193', 'T4', 12, 9.0, 100.0)",
    "CREATE TABLE unique_transcript_data (\
     sample_id TEXT, gene_id TEXT, transcript_id TEXT, counts INTEGER, \
     cpm_normalized_tmm DOUBLE PRECISION, relative_abundance DOUBLE PRECISION)",
    "INSERT INTO unique_transcript_data VALUES \
     ('S1', 'ENSG00000130203', 'T1', 3, 2.5, 60.0)",
    "CREATE TABLE ingest_log (id INTEGER, note TEXT)",
];

/// Create and fill the fixture tables in a SQLite store.
pub async fn seed_sqlite(store: &SqliteStore) {
    for statement in SEED_STATEMENTS {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("Failed to seed SQLite fixture");
    }
}

/// Create and fill the fixture tables in a PostgreSQL store.
#[allow(dead_code)]
pub async fn seed_postgres(store: &PostgresStore) {
    for statement in SEED_STATEMENTS {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("Failed to seed PostgreSQL fixture");
    }
}

/// Annotation rows for `count` synthetic genes sharing the `GENE` prefix.
#[allow(dead_code)]
pub fn many_genes_statement(count: usize) -> String {
    let values: Vec<String> = (0..count)
        .map(|i| format!("('ENSGX{i:05}', 'GENE{i}', 'TX{i}', 'chr1', 1, 2, '+', 1)"))
        .collect();
    format!(
        "INSERT INTO transcript_annotation VALUES {}",
        values.join(", ")
    )
}
