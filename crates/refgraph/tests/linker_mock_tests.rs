//! End-to-end `add_references` tests: reconciliation against the store,
//! creation through the fallback chain, direction-aware linking, and the
//! idempotence guard.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use refgraph::config::Config;
use refgraph::error::PipelineError;
use refgraph::models::{CitationDirection, PaperRecord};
use refgraph::store::{MemoryStore, PaperStore};
use refgraph::ReferencePipeline;

fn setup(mock_server: &MockServer) -> (ReferencePipeline, Arc<MemoryStore>) {
    let config = Config::for_testing(&mock_server.uri());
    let store = Arc::new(MemoryStore::new());
    let pipeline = ReferencePipeline::new(&config, store.clone()).unwrap();
    (pipeline, store)
}

async fn insert_with_doi(store: &MemoryStore, title: &str, doi: &str) -> refgraph::models::PaperId {
    let mut record = PaperRecord::new(title);
    record.set_doi(doi);
    store.insert(record).await.unwrap()
}

fn cited(doi: Option<&str>, arxiv: Option<&str>) -> serde_json::Value {
    json!({
        "citedPaper": {
            "paperId": "x",
            "title": "A reference",
            "externalIds": {"DOI": doi, "ArXiv": arxiv}
        }
    })
}

#[tokio::test]
async fn test_add_references_links_creates_and_skips() {
    let mock_server = MockServer::start().await;
    let (pipeline, store) = setup(&mock_server);

    let seed = insert_with_doi(&store, "Seed Paper", "10.1000/seed").await;
    let existing = insert_with_doi(&store, "Existing Paper", "10.1000/exists").await;

    // Reference list: one hit, one DOI miss, one arXiv-only miss.
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/seed/references"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": [
                cited(Some("10.1000/exists"), None),
                cited(Some("10.1000/new"), None),
                cited(None, Some("2301.07041")),
            ]
        })))
        .mount(&mock_server)
        .await;

    // Citing list: one DOI that every provider fails on.
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/seed/citations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": [{"citingPaper": {
                "paperId": "c",
                "externalIds": {"DOI": "10.1000/citer"}
            }}]
        })))
        .mount(&mock_server)
        .await;

    // The DOI miss resolves through Semantic Scholar with a Crossref date.
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paperId": "new1",
            "title": "Newly Created",
            "year": 2021,
            "fieldsOfStudy": ["Biology"],
            "externalIds": {"DOI": "10.1000/new"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/works/10.1000/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "title": ["Newly Created"],
                "DOI": "10.1000/new",
                "published-online": {"date-parts": [[2021, 6, 30]]}
            }
        })))
        .mount(&mock_server)
        .await;

    // The arXiv miss resolves through the Atom API.
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2301.07041v1</id>
    <title>Preprint Reference</title>
    <summary>Summary.</summary>
    <published>2023-01-17T14:00:00Z</published>
    <author><name>First Author</name></author>
    <category term="cs.DC" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#,
        ))
        .mount(&mock_server)
        .await;

    // The citer's DOI fails everywhere: 404 from Semantic Scholar and
    // Crossref (unmocked), 500 from CSL.
    Mock::given(method("GET"))
        .and(path("/10.1000/citer"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agency down"))
        .mount(&mock_server)
        .await;

    let report = pipeline.add_references(seed).await.unwrap();

    assert_eq!(report.directions.len(), 2);
    assert!(report.skipped.is_empty());

    let forward = &report.directions[0];
    assert_eq!(forward.direction, CitationDirection::References);
    assert_eq!(forward.total_identifiers, 3);
    assert_eq!(forward.linked_existing, 1);
    assert_eq!(forward.created, 2);
    assert_eq!(forward.failed, 0);

    let backward = &report.directions[1];
    assert_eq!(backward.direction, CitationDirection::CitedBy);
    assert_eq!(backward.created, 0);
    assert_eq!(backward.failed, 1);

    // Seed, existing, the created DOI paper, the created arXiv paper.
    assert_eq!(store.paper_count().await, 4);
    // Three forward edges from the seed; the failed citer added none.
    assert_eq!(store.edge_count().await, 3);
    assert_eq!(store.reference_count(seed, CitationDirection::References).await.unwrap(), 3);
    assert_eq!(store.reference_count(seed, CitationDirection::CitedBy).await.unwrap(), 0);
    assert_eq!(store.reference_count(existing, CitationDirection::CitedBy).await.unwrap(), 1);

    // The created DOI record carries the Crossref date overlay.
    let created = store
        .find_by_identifiers(&[refgraph::models::PaperIdentifier::Doi("10.1000/new".into())])
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].1.publish_date, chrono::NaiveDate::from_ymd_opt(2021, 6, 30));
}

#[tokio::test]
async fn test_linked_direction_is_skipped_on_rerun() {
    let mock_server = MockServer::start().await;
    let (pipeline, store) = setup(&mock_server);

    let seed = insert_with_doi(&store, "Seed", "10.1000/seed").await;
    let referenced = insert_with_doi(&store, "Referenced", "10.1000/ref").await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/seed/references"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": [cited(Some("10.1000/ref"), None)]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/seed/citations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": []
        })))
        .mount(&mock_server)
        .await;

    let first = pipeline.add_references(seed).await.unwrap();
    assert_eq!(first.directions[0].linked_existing, 1);

    // Forward edges now exist, so the second run must not refetch the
    // reference list (the mock's expect(1) enforces it).
    let second = pipeline.add_references(seed).await.unwrap();
    assert!(second.skipped.contains(&CitationDirection::References));
    assert_eq!(store.reference_count(seed, CitationDirection::References).await.unwrap(), 1);
    let _ = referenced;
}

#[tokio::test]
async fn test_paper_without_identifiers_is_rejected() {
    let mock_server = MockServer::start().await;
    let (pipeline, store) = setup(&mock_server);

    let paper = store.insert(PaperRecord::new("No identifiers")).await.unwrap();
    let err = pipeline.add_references(paper).await.unwrap_err();

    assert!(matches!(err, PipelineError::Validation { .. }));
}

#[tokio::test]
async fn test_arxiv_seeded_paper_uses_alternate_id() {
    let mock_server = MockServer::start().await;
    let (pipeline, store) = setup(&mock_server);

    let mut record = PaperRecord::new("Preprint");
    record.arxiv_id = Some("2301.07041".into());
    let seed = store.insert(record).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/arXiv:2301.07041/references"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": []
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/arXiv:2301.07041/citations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": []
        })))
        .mount(&mock_server)
        .await;

    let report = pipeline.add_references(seed).await.unwrap();
    assert_eq!(report.total_linked(), 0);
    assert_eq!(report.directions.len(), 2);
}

#[tokio::test]
async fn test_dead_provider_for_one_direction_keeps_the_other() {
    let mock_server = MockServer::start().await;
    let (pipeline, store) = setup(&mock_server);

    let seed = insert_with_doi(&store, "Seed", "10.1000/seed").await;
    insert_with_doi(&store, "Referenced", "10.1000/ref").await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/seed/references"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0,
            "next": null,
            "data": [cited(Some("10.1000/ref"), None)]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/10.1000/seed/citations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let report = pipeline.add_references(seed).await.unwrap();

    assert_eq!(report.directions.len(), 1);
    assert_eq!(report.fetch_failures, vec![CitationDirection::CitedBy]);
    assert_eq!(store.reference_count(seed, CitationDirection::References).await.unwrap(), 1);
}
