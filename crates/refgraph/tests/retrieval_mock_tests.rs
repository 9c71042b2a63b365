//! URL metadata retrieval tests: PDF probing, method ordering, per-method
//! behavior, and attempt journaling.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use refgraph::config::Config;
use refgraph::models::{PaperId, PaperRecord};
use refgraph::retrieval::RetrievalMethod;
use refgraph::store::{MemoryStore, PaperStore};
use refgraph::MetadataRetriever;

fn setup(mock_server: &MockServer) -> (MetadataRetriever, Arc<MemoryStore>) {
    let config = Config::for_testing(&mock_server.uri());
    let store = Arc::new(MemoryStore::new());
    let retriever = MetadataRetriever::new(&config, store.clone()).unwrap();
    (retriever, store)
}

async fn insert_url_seeded(store: &MemoryStore, title: &str, url: String) -> PaperId {
    let mut record = PaperRecord::new(title);
    record.url = Some(url);
    store.insert(record).await.unwrap()
}

fn methods(attempts: &[(PaperId, RetrievalMethod)]) -> Vec<RetrievalMethod> {
    attempts.iter().map(|(_, m)| *m).collect()
}

// =============================================================================
// PDF probing
// =============================================================================

#[tokio::test]
async fn test_probe_detects_pdf_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.5".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let (retriever, _) = setup(&mock_server);
    assert!(retriever.url_points_to_pdf(&format!("{}/files/paper.pdf", mock_server.uri())).await);
}

#[tokio::test]
async fn test_probe_html_is_not_pdf() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html></html>"),
        )
        .mount(&mock_server)
        .await;

    let (retriever, _) = setup(&mock_server);
    assert!(!retriever.url_points_to_pdf(&format!("{}/article/1", mock_server.uri())).await);
}

#[tokio::test]
async fn test_probe_sciencedirect_download_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sciencedirect/science/article/pii/1"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let (retriever, _) = setup(&mock_server);
    let url =
        format!("{}/sciencedirect/science/article/pii/1?download=false", mock_server.uri());
    assert!(retriever.url_points_to_pdf(&url).await);
}

#[tokio::test]
async fn test_probe_unreachable_host_is_not_pdf() {
    let mock_server = MockServer::start().await;
    let (retriever, _) = setup(&mock_server);

    assert!(!retriever.url_points_to_pdf("http://127.0.0.1:1/paper.pdf").await);
}

// =============================================================================
// Landing page methods
// =============================================================================

#[tokio::test]
async fn test_pdf_from_url_wins_on_landing_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article/1"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "text/html").set_body_string(
                r#"<html><head>
                <meta name="citation_pdf_url" content="https://journal.example/files/1.pdf">
                </head></html>"#,
            ),
        )
        .mount(&mock_server)
        .await;

    let (retriever, store) = setup(&mock_server);
    let paper =
        insert_url_seeded(&store, "Uploaded", format!("{}/article/1", mock_server.uri())).await;

    let winner = retriever.populate_from_url(paper).await.unwrap();
    assert_eq!(winner, Some(RetrievalMethod::PdfFromUrl));

    let record = store.get(paper).await.unwrap().unwrap();
    assert_eq!(record.pdf_url.as_deref(), Some("https://journal.example/files/1.pdf"));

    assert_eq!(methods(&store.attempts().await), vec![RetrievalMethod::PdfFromUrl]);
}

#[tokio::test]
async fn test_csl_url_resolves_meta_tag_doi() {
    let mock_server = MockServer::start().await;

    // No citation_pdf_url, so PdfFromUrl fails and CslUrl takes over.
    Mock::given(method("GET"))
        .and(path("/article/2"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "text/html").set_body_string(
                r#"<html><head>
                <meta name="citation_doi" content="10.5555/page">
                </head></html>"#,
            ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/10.5555/page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "article-journal",
            "title": "Resolved From Page",
            "DOI": "10.5555/page",
            "author": [{"given": "Grace", "family": "Hopper"}],
            "issued": {"date-parts": [[2015, 9, 1]]}
        })))
        .mount(&mock_server)
        .await;

    let (retriever, store) = setup(&mock_server);
    let paper =
        insert_url_seeded(&store, "Uploaded", format!("{}/article/2", mock_server.uri())).await;

    let winner = retriever.populate_from_url(paper).await.unwrap();
    assert_eq!(winner, Some(RetrievalMethod::CslUrl));

    let record = store.get(paper).await.unwrap().unwrap();
    assert_eq!(record.doi.as_deref(), Some("10.5555/page"));
    assert_eq!(record.paper_title.as_deref(), Some("Resolved From Page"));
    assert_eq!(record.raw_authors, vec!["Grace Hopper"]);
    // The uploaded title is kept.
    assert_eq!(record.title, "Uploaded");

    assert_eq!(
        methods(&store.attempts().await),
        vec![RetrievalMethod::PdfFromUrl, RetrievalMethod::CslUrl]
    );
}

// =============================================================================
// PDF URL methods
// =============================================================================

#[tokio::test]
async fn test_parse_pdf_finds_doi_in_bytes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_string("%PDF-1.5 ... doi:10.1234/pdfdoi ..."),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/works/10.1234/pdfdoi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "title": ["Found In PDF"],
                "DOI": "10.1234/pdfdoi",
                "created": {"date-parts": [[2012, 4, 2]]}
            }
        })))
        .mount(&mock_server)
        .await;

    let (retriever, store) = setup(&mock_server);
    let paper =
        insert_url_seeded(&store, "", format!("{}/files/paper.pdf", mock_server.uri())).await;

    let winner = retriever.populate_from_url(paper).await.unwrap();
    assert_eq!(winner, Some(RetrievalMethod::ParsePdf));

    let record = store.get(paper).await.unwrap().unwrap();
    assert_eq!(record.doi.as_deref(), Some("10.1234/pdfdoi"));
    assert_eq!(record.title, "Found In PDF");

    // CslPdfUrl ran first and found nothing in the URL itself.
    assert_eq!(
        methods(&store.attempts().await),
        vec![RetrievalMethod::CslPdfUrl, RetrievalMethod::ParsePdf]
    );
}

#[tokio::test]
async fn test_crossref_query_is_last_resort_for_pdfs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/anon.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_string("%PDF-1.5 no identifiers in here"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "items": [{
                    "title": ["An Uploaded Manuscript"],
                    "DOI": "10.9999/query-hit"
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let (retriever, store) = setup(&mock_server);
    let paper = insert_url_seeded(
        &store,
        "An Uploaded Manuscript",
        format!("{}/files/anon.pdf", mock_server.uri()),
    )
    .await;

    let winner = retriever.populate_from_url(paper).await.unwrap();
    assert_eq!(winner, Some(RetrievalMethod::CrossrefQuery));

    let record = store.get(paper).await.unwrap().unwrap();
    assert_eq!(record.doi.as_deref(), Some("10.9999/query-hit"));

    assert_eq!(
        methods(&store.attempts().await),
        vec![
            RetrievalMethod::CslPdfUrl,
            RetrievalMethod::ParsePdf,
            RetrievalMethod::CrossrefQuery,
        ]
    );
}

// =============================================================================
// Chain exhaustion and validation
// =============================================================================

#[tokio::test]
async fn test_exhausted_chain_journals_every_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article/bare"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>nothing useful</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let (retriever, store) = setup(&mock_server);
    let paper =
        insert_url_seeded(&store, "Bare", format!("{}/article/bare", mock_server.uri())).await;

    let winner = retriever.populate_from_url(paper).await.unwrap();
    assert!(winner.is_none());

    assert_eq!(
        methods(&store.attempts().await),
        vec![RetrievalMethod::PdfFromUrl, RetrievalMethod::CslUrl]
    );
}

#[tokio::test]
async fn test_paper_without_url_is_rejected() {
    let mock_server = MockServer::start().await;
    let (retriever, store) = setup(&mock_server);

    let paper = store.insert(PaperRecord::new("No URL")).await.unwrap();
    let err = retriever.populate_from_url(paper).await.unwrap_err();

    assert!(matches!(err, refgraph::PipelineError::Validation { .. }));
}

#[tokio::test]
async fn test_invalid_seed_url_is_rejected() {
    let mock_server = MockServer::start().await;
    let (retriever, store) = setup(&mock_server);

    let paper = insert_url_seeded(&store, "Bad URL", "not a url at all".to_string()).await;
    let err = retriever.populate_from_url(paper).await.unwrap_err();

    assert!(matches!(err, refgraph::PipelineError::Validation { .. }));
    assert!(store.attempts().await.is_empty());
}

#[tokio::test]
async fn test_known_doi_resolves_directly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article/3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html></html>"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/10.7777/known"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "article-journal",
            "title": "Known DOI Paper",
            "DOI": "10.7777/known",
            "abstract": "Resolved without touching the page."
        })))
        .mount(&mock_server)
        .await;

    let (retriever, store) = setup(&mock_server);

    let mut record = PaperRecord::new("Uploaded");
    record.url = Some(format!("{}/article/3", mock_server.uri()));
    record.set_doi("10.7777/known");
    let paper = store.insert(record).await.unwrap();

    let winner = retriever.populate_from_url(paper).await.unwrap();
    assert_eq!(winner, Some(RetrievalMethod::CslDoi));

    let record = store.get(paper).await.unwrap().unwrap();
    assert_eq!(record.abstract_text.as_deref(), Some("Resolved without touching the page."));

    assert_eq!(methods(&store.attempts().await), vec![RetrievalMethod::CslDoi]);
}
