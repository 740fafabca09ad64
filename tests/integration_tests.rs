//! Integration tests for DOI Search
//!
//! These tests drive the public pipeline API against a local mock of the
//! OpenAlex `/works` endpoint.

use doi_search::config::Config;
use doi_search::input::read_csv_dois;
use doi_search::models::{fields, RunOutcome};
use doi_search::pipeline::{
    oa_sentence, FetchOptions, Pipeline, PipelineError, RunRequest, RunSummary,
};
use doi_search::sources::OpenAlexSource;
use doi_search::utils::{BatchSize, InputError};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn work(doi: &str, oa_status: &str, is_oa: bool, journal: &str, institution: &str) -> Value {
    json!({
        "id": format!("https://openalex.org/W-{}", doi),
        "doi": format!("https://doi.org/{}", doi),
        "title": format!("Work {}", doi),
        "publication_year": 2023,
        "open_access": {"is_oa": is_oa, "oa_status": oa_status},
        "primary_location": {"source": {"display_name": journal}},
        "authorships": [{
            "author_position": "first",
            "author": {"display_name": format!("Author of {}", doi), "orcid": null},
            "is_corresponding": true,
            "raw_author_name": format!("Author of {}", doi),
            "institutions": [{
                "display_name": institution,
                "country_code": "GB",
                "type": "education"
            }]
        }]
    })
}

fn results(works: Vec<Value>) -> String {
    json!({"meta": {"count": works.len()}, "results": works}).to_string()
}

fn pipeline(server_url: &str, batch_size: usize) -> Pipeline {
    let source =
        OpenAlexSource::with_base_url(server_url, Some("test@example.org".to_string()), Duration::from_secs(5))
            .unwrap();
    let options = FetchOptions {
        batch_size: BatchSize::new(batch_size),
        ..FetchOptions::default()
    };
    Pipeline::new(Arc::new(source), options)
}

#[tokio::test]
async fn test_end_to_end_with_failed_batch() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/works")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("filter".into(), "doi:10.1/a|10.1/b".into()),
            Matcher::UrlEncoded("mailto".into(), "test@example.org".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(results(vec![
            work("10.1/a", "gold", true, "Journal A", "Univ X"),
            work("10.1/b", "closed", false, "Journal B", "Univ Y"),
        ]))
        .create_async()
        .await;

    let second = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "doi:10.1/c|10.1/d".into(),
        ))
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let third = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "doi:10.1/E|10.1/f".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(results(vec![work("10.1/e", "gold", true, "Journal A", "Univ X")]))
        .create_async()
        .await;

    let request = RunRequest::new([
        "https://doi.org/10.1/a",
        "10.1/b",
        "doi:10.1/c",
        "10.1/d",
        "10.1/E",
        "10.1/f",
        "10.1/a",
    ]);
    let report = pipeline(&server.url(), 2).run(&request).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;

    // One row per unique DOI, in submission order
    let dois: Vec<&str> = report.rows.iter().map(|r| r.doi.as_str()).collect();
    assert_eq!(dois, vec!["10.1/a", "10.1/b", "10.1/c", "10.1/d", "10.1/E", "10.1/f"]);

    assert_eq!(report.total_batches, 3);
    assert_eq!(report.failed_batches.len(), 1);
    assert_eq!(report.failed_batches[0].index, 1);
    assert_eq!(report.matched(), 3);
    assert_eq!(report.outcome(), RunOutcome::Found(3));

    // DOIs of the failed batch carry no metadata
    assert!(!report.rows[2].is_matched());
    assert!(!report.rows[3].is_matched());
    assert!(report.rows[2].field(fields::OA_STATUS).is_none());

    // Case differences do not prevent a match
    assert_eq!(report.rows[4].text(fields::OA_STATUS).as_deref(), Some("gold"));

    let summary = RunSummary::from_report(&report);
    assert_eq!(summary.oa_status.count_of(Some("gold")), 2);
    assert_eq!(summary.oa_status.count_of(Some("closed")), 1);
    assert_eq!(summary.oa_status.count_of(None), 3);
    assert_eq!(summary.oa_status.total(), report.rows.len());
    assert_eq!(summary.journals.count_of(Some("Journal A")), 2);
    assert_eq!(summary.is_oa.count_of(Some("Open Access")), 2);
    assert_eq!(summary.is_oa.count_of(Some("Closed Access")), 1);

    assert_eq!(summary.authors.len(), 3);
    assert_eq!(summary.institutions.count_of(Some("Univ X")), 2);
    assert_eq!(summary.countries.count_of(Some("GB")), 3);

    let sentence = oa_sentence(&summary.is_oa).unwrap();
    assert!(sentence.contains("2 Open Access"));
    assert!(sentence.contains("1 Closed Access"));
}

#[tokio::test]
async fn test_no_results() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(results(vec![]))
        .create_async()
        .await;

    let report = pipeline(&server.url(), 20)
        .run(&RunRequest::from_text("10.9999/nothing\n10.9999/none"))
        .await
        .unwrap();

    assert_eq!(report.outcome(), RunOutcome::NoResults);
    assert_eq!(report.rows.len(), 2);
    assert!(report.failed_batches.is_empty());
}

#[tokio::test]
async fn test_empty_input_makes_no_requests() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = pipeline(&server.url(), 20)
        .run(&RunRequest::from_text("\n   \n"))
        .await;

    assert!(matches!(result, Err(PipelineError::Input(InputError::NoDois))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_csv_input_through_pipeline() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "doi:10.1/a|10.1/b".into(),
        ))
        .with_status(200)
        .with_body(results(vec![work("10.1/b", "green", true, "Journal B", "Univ Z")]))
        .create_async()
        .await;

    let csv = "title,DOI\nFirst,https://doi.org/10.1/a\nSecond,10.1/b\nThird,\n";
    let submitted = read_csv_dois(csv.as_bytes()).unwrap();
    let report = pipeline(&server.url(), 20)
        .run(&RunRequest::new(submitted))
        .await
        .unwrap();

    assert_eq!(report.rows.len(), 2);
    assert!(!report.rows[0].is_matched());
    assert!(report.rows[1].is_matched());
}

#[tokio::test]
async fn test_separator_in_doi_leaves_batch_intact() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "doi:10.1/a|10.1/b".into(),
        ))
        .with_status(200)
        .with_body(results(vec![
            work("10.1/a", "gold", true, "Journal A", "Univ X"),
            work("10.1/b", "bronze", true, "Journal B", "Univ Y"),
        ]))
        .expect(1)
        .create_async()
        .await;

    let request = RunRequest::new(["10.1/a", "10.1/x, 10.1/y", "10.1/b"]);
    let report = pipeline(&server.url(), 20).run(&request).await.unwrap();
    mock.assert_async().await;

    assert_eq!(report.rows.len(), 3);
    assert!(report.failed_batches.is_empty());
    assert!(report.rows[0].is_matched());
    assert!(!report.rows[1].is_matched());
    assert!(report.rows[2].is_matched());
    assert_eq!(report.outcome(), RunOutcome::Found(2));
}

#[test]
fn test_default_config_builds_pipeline_options() {
    let options = Config::default().fetch_options();
    assert_eq!(options, FetchOptions::default());
    assert_eq!(options.batch_size.get(), 20);
}

#[test]
fn test_version() {
    assert!(!doi_search::VERSION.is_empty());
}
