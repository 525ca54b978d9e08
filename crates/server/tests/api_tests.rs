//! Integration tests for HTTP API endpoints.

mod common;

use axum::http::StatusCode;
use common::{APOC1_ID, APOE_ID, APOER2_ID, TestServer, text_request};
use serde_json::{Value, json};

fn transcript_ids(records: &Value) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for record in records.as_array().unwrap() {
        let id = record["transcript_id"].as_str().unwrap().to_string();
        if ids.last() != Some(&id) {
            ids.push(id);
        }
    }
    ids
}

#[tokio::test]
async fn test_health_reports_index_state() {
    let server = TestServer::new().await;

    let (status, body) = server.get("/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "sqlite");
    assert_eq!(body["gene_index"]["state"], "unloaded");
    assert_eq!(body["gene_index"]["genes"], 0);

    server.state.index.ensure_loaded().await;
    let (_, body) = server.get("/v1/health").await;
    assert_eq!(body["gene_index"]["state"], "loaded");
    assert_eq!(body["gene_index"]["genes"], 4);
    assert!(body["gene_index"]["loaded_at"].is_string());
}

#[tokio::test]
async fn test_list_matrices_in_fixed_order() {
    let server = TestServer::new().await;

    let (status, body) = server.get("/v1/matrices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["options"],
        json!([
            {"label": "Total Counts", "value": "total_transcript_data"},
            {"label": "Unique Counts", "value": "unique_transcript_data"},
        ])
    );
}

#[tokio::test]
async fn test_table_info_preview() {
    let server = TestServer::new().await;

    let (status, body) = server
        .get("/v1/matrices/total_transcript_data?format=records")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table"], "total_transcript_data");
    assert_eq!(body["row_count"], 7);
    assert_eq!(body["col_count"], 6);
    assert_eq!(body["preview"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_non_matrix_tables_are_rejected() {
    let server = TestServer::new().await;

    let (status, body) = server.get("/v1/matrices/ingest_log").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unknown_table");

    let (status, body) = server.get("/v1/matrices/missing_transcript_data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unknown_table");

    let uri = format!("/v1/genes/{APOE_ID}/expression?table=ingest_log");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unknown_table");
}

#[tokio::test]
async fn test_search_endpoint() {
    let server = TestServer::new().await;

    let (status, body) = server.get("/v1/genes/search?q=APOE").await;
    assert_eq!(status, StatusCode::OK);
    let options = body["options"].as_array().unwrap();
    assert_eq!(options[0]["value"], APOE_ID);
    assert_eq!(options[0]["label"], format!("APOE ({APOE_ID})"));
    assert_eq!(options[1]["value"], APOER2_ID);

    let (status, body) = server.get("/v1/genes/search?q=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["options"], json!([]));

    let (status, body) = server.get("/v1/genes/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["options"], json!([]));
}

#[tokio::test]
async fn test_expression_joined_with_metadata() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/expression?format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gene_name"], "APOE");
    assert_eq!(body["table"], "total_transcript_data");
    assert_eq!(body["total_rows"], 6);
    assert_eq!(body["returned_rows"], 6);
    assert_eq!(body["metadata_joined"], true);
    assert_eq!(body["has_metadata"], true);
    assert_eq!(body["message"], "Showing data for 6 total rows");
    assert_eq!(body["warnings"], json!([]));
    assert!(body.get("degraded_reason").is_none());

    let records = body["data"].as_array().unwrap();
    let s1 = records
        .iter()
        .find(|r| r["sample_id"] == "S1")
        .unwrap();
    assert_eq!(s1["diagnosis"], "AD");
    assert_eq!(s1["RIN"], 7.5);
    let s2 = records
        .iter()
        .find(|r| r["sample_id"] == "S2")
        .unwrap();
    assert_eq!(s2["RIN"], Value::Null);
}

#[tokio::test]
async fn test_expression_limit_handling() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/expression?limit=2");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["returned_rows"], 2);
    assert_eq!(body["total_rows"], 6);
    assert_eq!(body["message"], "Showing 2 of 6 total rows");

    let uri = format!("/v1/genes/{APOE_ID}/expression?limit=all");
    let (_, body) = server.get(&uri).await;
    assert_eq!(body["returned_rows"], 6);

    let uri = format!("/v1/genes/{APOE_ID}/expression?limit=lots");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["returned_rows"], 6);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_expression_columnar_format() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/expression");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    let columns = body["data"].as_array().unwrap();
    assert_eq!(columns[0]["name"], "sample_id");
    assert_eq!(columns[0]["values"].as_array().unwrap().len(), 6);
    let names: Vec<&str> = columns
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"sample_and_flowcell_id"));
    assert!(names.contains(&"diagnosis"));
}

#[tokio::test]
async fn test_expression_errors() {
    let server = TestServer::new().await;

    let (status, body) = server.get("/v1/genes/ENSG_NOPE/expression").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "gene_not_found");

    let uri = format!("/v1/genes/{APOC1_ID}/expression");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let uri = format!("/v1/genes/{APOE_ID}/expression?format=csv");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "core_error");
}

#[tokio::test]
async fn test_transcripts_top_n_window() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/transcripts?top_n=2&format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"], "2");
    assert_eq!(body["transcripts"], 2);
    // T1 contributes two exon rows.
    assert_eq!(body["annotation"].as_array().unwrap().len(), 3);
    assert_eq!(transcript_ids(&body["annotation"]), vec!["T1", "T2"]);
    assert_eq!(transcript_ids(&body["expression"]), vec!["T1", "T2"]);
    assert_eq!(
        body["subplot_titles"],
        json!(["Transcript Structure", "Counts", "TMM", "Relative Abundance"])
    );
    assert_eq!(body["expression_hue"], Value::Null);
}

#[tokio::test]
async fn test_transcripts_default_window_too_wide_keeps_all() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/transcripts?format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"], "[0, 5]");
    assert_eq!(body["transcripts"], 3);
    assert_eq!(body["annotation"].as_array().unwrap().len(), 5);
    assert_eq!(transcript_ids(&body["annotation"]), vec!["T3", "T1", "T2"]);
}

#[tokio::test]
async fn test_transcripts_range_window() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/transcripts?start=1&end=3&format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcripts"], 2);
    assert_eq!(transcript_ids(&body["annotation"]), vec!["T3", "T2"]);
}

#[tokio::test]
async fn test_transcripts_bad_window_is_recovered() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/transcripts?top_n=abc&format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"], "[0, 5]");
    assert!(!body["warnings"].as_array().unwrap().is_empty());

    let uri = format!("/v1/genes/{APOE_ID}/transcripts?start=3&end=1&format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transcript_ids(&body["annotation"]), vec!["T3", "T1", "T2"]);
    assert!(!body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_transcripts_log_transform_and_hue() {
    let server = TestServer::new().await;

    let uri = format!(
        "/v1/genes/{APOE_ID}/transcripts?top_n=1&log_transform=true&hue=diagnosis,sex&format=records"
    );
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["expression_columns"],
        json!(["log_counts", "log_cpm_normalized_tmm", "relative_abundance"])
    );
    assert_eq!(body["expression_hue"], "combined_metadata");

    let records = body["expression"].as_array().unwrap();
    let s1 = records.iter().find(|r| r["sample_id"] == "S1").unwrap();
    assert_eq!(s1["combined_metadata"], "AD | F");
    assert!(s1["log_counts"].is_number());
}

#[tokio::test]
async fn test_transcripts_unknown_hue_warns() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/transcripts?hue=braak_tangle_score");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expression_hue"], Value::Null);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_summary_aggregates_per_transcript() {
    let server = TestServer::new().await;

    let uri = format!("/v1/genes/{APOE_ID}/summary?format=records");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_by"], "transcript_id");
    assert_eq!(body["value_column"], "cpm_normalized_tmm");
    assert_eq!(body["rows_used"], 6);

    let summary = body["summary"].as_array().unwrap();
    let t1 = summary
        .iter()
        .find(|r| r["transcript_id"] == "T1")
        .unwrap();
    assert_eq!(t1["sum_cpm_normalized_tmm"].as_f64(), Some(50.0));
    assert_eq!(t1["sample_count"], 2);
}

#[tokio::test]
async fn test_summary_threshold_and_pivot() {
    let server = TestServer::new().await;

    let uri = format!(
        "/v1/genes/{APOE_ID}/summary?min_expression=25&pivot=sample_id&format=records"
    );
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows_used"], 3);
    let pivot = body["pivot"].as_array().unwrap();
    assert_eq!(pivot.len(), 2);

    let uri = format!("/v1/genes/{APOE_ID}/summary?column=nope");
    let (status, body) = server.get(&uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_clear_cache_endpoint() {
    let server = TestServer::new().await;

    server.get("/v1/genes/search?q=apoe").await;
    let uri = format!("/v1/genes/{APOE_ID}/expression");
    server.get(&uri).await;

    let (status, body) = server.post("/v1/admin/cache/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"]["search"], 1);
    assert_eq!(body["cleared"]["matrix"], 1);
    assert_eq!(body["cleared"]["gene_info"], 1);
    let index_state = body["gene_index"].as_str().unwrap();
    assert!(index_state == "loading" || index_state == "loaded");

    assert!(server.state.cache.searches.is_empty());
    assert!(server.state.cache.matrices.is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    isoview_server::metrics::register_metrics();
    let server = TestServer::new().await;
    server.get("/v1/genes/search?q=apoe").await;

    let (status, body) = text_request(&server.router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("isoview_search_requests_total"));
}

#[tokio::test]
async fn test_metrics_endpoint_can_be_disabled() {
    let server = TestServer::with_config(|config| {
        config.server.metrics_enabled = false;
    })
    .await;

    let (status, _) = text_request(&server.router, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_empties_caches_and_closes_store() {
    let server = TestServer::new().await;
    server.get("/v1/genes/search?q=apoe").await;
    assert!(!server.state.cache.searches.is_empty());

    server.state.cleanup().await;

    assert!(server.state.cache.searches.is_empty());
    assert!(server.state.index.is_empty());
    assert!(server.state.store.health_check().await.is_err());
}
