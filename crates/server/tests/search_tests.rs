//! Gene search behaviour against a real store.

mod common;

use common::{APOE_ID, APOER2_ID, CountingStore, TestServer, TestStore, many_genes_statement};
use isoview_server::cache::CacheKind;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_results_are_capped_and_unique() {
    let server = TestServer::new().await;
    server.store.execute(&many_genes_statement(25)).await;
    // A second transcript for the same gene must not produce a duplicate.
    server
        .store
        .execute("INSERT INTO transcript_annotation VALUES ('ENSGX00001', 'GENE1', 'TX1b', 'chr1', 3, 4, '+', 1)")
        .await;

    let options = server.state.search.search_genes("gene", None).await;
    assert_eq!(options.len(), 10);
    let values: HashSet<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values.len(), 10);
}

#[tokio::test]
async fn test_exact_match_precedes_prefix_match() {
    let server = TestServer::new().await;

    let options = server.state.search.search_genes("apoe", None).await;
    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec![APOE_ID, APOER2_ID]);
}

#[tokio::test]
async fn test_exact_id_match_is_found() {
    let server = TestServer::new().await;

    let options = server
        .state
        .search
        .search_genes(&APOE_ID.to_lowercase(), None)
        .await;
    assert_eq!(options[0].value, APOE_ID);
}

#[tokio::test]
async fn test_blank_query_returns_nothing_without_loading() {
    let server = TestServer::new().await;

    assert!(server.state.search.search_genes("", None).await.is_empty());
    assert!(server.state.search.search_genes("   ", Some("apoe")).await.is_empty());
    assert_eq!(
        server.state.index.state(),
        isoview_server::LoadState::Unloaded
    );
}

#[tokio::test]
async fn test_index_results_are_cached() {
    let store = TestStore::new().await;
    let counting = Arc::new(CountingStore::new(store.store()));
    let server = TestServer::wrapping(store, counting.clone()).await;

    let first = server.state.search.search_genes("APOE", None).await;
    let queries = counting.queries();
    let second = server.state.search.search_genes(" apoe ", None).await;

    assert_eq!(first, second);
    assert_eq!(counting.queries(), queries);
    let stats = server.state.cache.stats(CacheKind::Search);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_database_fallback_when_index_is_empty() {
    let store = TestStore::new().await;
    let counting = Arc::new(CountingStore::new(store.store()));
    let server = TestServer::wrapping(store, counting.clone()).await;

    // Break only the index load; the ranked search statement still works.
    counting.fail_when("SELECT DISTINCT gene_id, gene_name FROM transcript_annotation ORDER BY");

    let options = server.state.search.search_genes("apoe", None).await;
    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec![APOE_ID, APOER2_ID]);
    assert!(server.state.index.is_empty());

    // Database results are not cached.
    assert!(server.state.cache.searches.is_empty());
}

#[tokio::test]
async fn test_short_query_uses_prefix_search_in_fallback() {
    let store = TestStore::new().await;
    let counting = Arc::new(CountingStore::new(store.store()));
    let server = TestServer::wrapping(store, counting.clone()).await;
    counting.fail_when("SELECT DISTINCT gene_id, gene_name FROM transcript_annotation ORDER BY");

    let options = server.state.search.search_genes("ap", None).await;
    let names: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|label| label.starts_with("APO")));

    // "p5" only occurs inside TP53; short queries match prefixes only.
    let options = server.state.search.search_genes("p5", None).await;
    assert!(options.is_empty());
}

#[tokio::test]
async fn test_failing_database_search_returns_empty() {
    let store = TestStore::new().await;
    let counting = Arc::new(CountingStore::new(store.store()));
    let server = TestServer::wrapping(store, counting.clone()).await;
    counting.fail_when("transcript_annotation");

    let options = server.state.search.search_genes("apoe", None).await;
    assert!(options.is_empty());
}
