//! Integration tests for the Jira tracker and the retrieval engine.
//!
//! These run the real `JiraTracker` against a local wiremock server, so
//! the HTTP layer (auth, query parameters, error mapping) is exercised
//! end to end without touching a live Jira site.

use bugsift::tracker::jira::JiraTracker;
use bugsift::tracker::{RetrievalError, RetrievalQuery, Retriever, Tracker, TrackerError};
use serde_json::{json, Value};
use wiremock::matchers::{basic_auth, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "qa@acme.com";
const TOKEN: &str = "ATATT3xFfGF0-test-token";

fn tracker(server: &MockServer) -> JiraTracker {
    JiraTracker::new(&server.uri(), EMAIL, TOKEN).expect("client builds")
}

fn issue(id: &str, key: &str, summary: &str) -> Value {
    json!({
        "id": id,
        "key": key,
        "fields": {
            "summary": summary,
            "status": { "name": "Open" },
            "priority": { "name": "High" },
            "components": [{ "name": "Checkout" }],
            "labels": ["regression"],
            "created": "2026-03-01T10:00:00.000+0000",
            "description": {
                "type": "doc",
                "content": [{
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": "Crashes on submit" }]
                }]
            }
        }
    })
}

async fn mount_issue(server: &MockServer, id: &str, key: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/api/3/issue/{}", id)))
        .and(query_param("fields", "*all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue(id, key, key)))
        .mount(server)
        .await;
}

mod tracker_endpoints {
    use super::*;

    #[tokio::test]
    async fn myself_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .and(basic_auth(EMAIL, TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "displayName": "QA Bot",
                "emailAddress": EMAIL
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = tracker(&server).myself().await.unwrap();
        assert_eq!(user.display_name, "QA Bot");
        assert_eq!(user.email.as_deref(), Some(EMAIL));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = tracker(&server).myself().await.unwrap_err();
        assert!(err.is_auth(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_are_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/1"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/2"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "errorMessages": ["maintenance"]
            })))
            .mount(&server)
            .await;

        let tracker = tracker(&server);
        assert!(matches!(
            tracker.issue("1").await,
            Err(TrackerError::RateLimited)
        ));
        match tracker.issue("2").await {
            Err(TrackerError::ApiError { status, message }) => {
                assert_eq!(status, 503);
                assert!(message.contains("maintenance"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_ids_sends_query_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(query_param("jql", "project = \"PROJ\""))
            .and(query_param("maxResults", "25"))
            .and(query_param_is_missing("nextPageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{ "id": "10001" }, { "id": 10002 }],
                "nextPageToken": "page-2",
                "isLast": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = tracker(&server)
            .search_ids("project = \"PROJ\"", 25, None)
            .await
            .unwrap();
        assert_eq!(page.issue_ids, vec!["10001", "10002"]);
        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
        assert!(!page.is_last);
    }

    #[tokio::test]
    async fn filter_jql_reads_stored_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/filter/10400"))
            .and(query_param("expand", "jql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "10400",
                "name": "Escapes",
                "jql": "labels = escape"
            })))
            .mount(&server)
            .await;

        let jql = tracker(&server).filter_jql("10400").await.unwrap();
        assert_eq!(jql, "labels = escape");
    }

    #[tokio::test]
    async fn missing_filter_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/filter/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errorMessages": ["The selected filter is not available to you"]
            })))
            .mount(&server)
            .await;

        match tracker(&server).filter_jql("999").await {
            Err(TrackerError::NotFound(message)) => {
                assert!(message.contains("not available"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_filters_lists_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/filter/search"))
            .and(query_param("filterName", "escape"))
            .and(query_param("maxResults", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    { "id": "10400", "name": "Escapes this sprint" },
                    { "id": 10401, "name": "Escapes by customer" }
                ]
            })))
            .mount(&server)
            .await;

        let filters = tracker(&server).search_filters("escape", 20).await.unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].id, "10400");
        assert_eq!(filters[1].id, "10401");
        assert_eq!(filters[1].name, "Escapes by customer");
    }
}

mod retrieval {
    use super::*;

    #[tokio::test]
    async fn follows_continuation_tokens_and_maps_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(query_param_is_missing("nextPageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{ "id": "1" }, { "id": "2" }],
                "nextPageToken": "t2",
                "isLast": false
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(query_param("nextPageToken", "t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{ "id": "3" }],
                "isLast": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        for (id, key) in [("1", "BUG-1"), ("2", "BUG-2"), ("3", "BUG-3")] {
            mount_issue(&server, id, key).await;
        }

        let tracker = tracker(&server);
        let bugs = Retriever::new(&tracker)
            .fetch(&RetrievalQuery {
                project: Some("BUG".to_string()),
                max_results: 10,
                ..RetrievalQuery::default()
            })
            .await
            .unwrap();

        let keys: Vec<&str> = bugs.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["BUG-1", "BUG-2", "BUG-3"]);
        assert_eq!(bugs[0].status, "Open");
        assert_eq!(bugs[0].components, vec!["Checkout"]);
        assert_eq!(bugs[0].description, "Crashes on submit");
    }

    #[tokio::test]
    async fn failed_hydration_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{ "id": "1" }, { "id": "2" }, { "id": "3" }],
                "isLast": true
            })))
            .mount(&server)
            .await;
        mount_issue(&server, "1", "BUG-1").await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_issue(&server, "3", "BUG-3").await;

        let tracker = tracker(&server);
        let bugs = Retriever::new(&tracker)
            .fetch(&RetrievalQuery::default())
            .await
            .unwrap();

        let keys: Vec<&str> = bugs.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["BUG-1", "BUG-3"]);
    }

    #[tokio::test]
    async fn saved_filter_query_is_used_for_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/filter/10400"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jql": "labels = escape"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(query_param("jql", "labels = escape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{ "id": "7" }],
                "isLast": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_issue(&server, "7", "ESC-7").await;

        let tracker = tracker(&server);
        let bugs = Retriever::new(&tracker)
            .fetch(&RetrievalQuery {
                filter_id: Some("10400".to_string()),
                jql: Some("ignored".to_string()),
                ..RetrievalQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].key, "ESC-7");
    }

    #[tokio::test]
    async fn rejected_search_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let tracker = tracker(&server);
        let err = Retriever::new(&tracker)
            .fetch(&RetrievalQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Auth(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn unreachable_tracker_is_a_connectivity_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let tracker = JiraTracker::new(&uri, EMAIL, TOKEN).unwrap();
        let err = Retriever::new(&tracker).test_connection().await.unwrap_err();
        assert!(
            matches!(err, RetrievalError::Connectivity(_)),
            "got {:?}",
            err
        );
    }
}
