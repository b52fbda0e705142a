use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tasksync::backend::{create_remote_store, BackendError, RemoteTask, RemoteTaskStore, RestRemoteTaskStore};
use tasksync::config::RemoteConfig;
use tasksync::entities::task::Priority;

fn store(server: &ServerGuard) -> RestRemoteTaskStore {
    RestRemoteTaskStore::new(&server.url(), "anon-key".to_string(), Some("session-token".to_string()))
}

fn sample_task() -> RemoteTask {
    RemoteTask {
        remote_id: None,
        local_id: 3,
        title: "Buy milk".to_string(),
        description: "2 litres".to_string(),
        is_done: false,
        priority: Priority::High,
        due_date: Some(Utc.timestamp_millis_opt(1_736_150_400_000).unwrap()),
        image_ref: Some("content://images/1".to_string()),
        list_id: 1,
        updated_at: Utc.timestamp_millis_opt(1_736_000_000_123).unwrap(),
    }
}

#[tokio::test]
async fn test_fetch_tasks_decodes_rows() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/tasks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("list_id".into(), "eq.1".into()),
        ]))
        .match_header("apikey", "anon-key")
        .match_header("authorization", "Bearer session-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "id": "r1",
                    "title": "Buy milk",
                    "description": "2 litres",
                    "is_done": true,
                    "priority": 2,
                    "due_date": 1_736_150_400_000i64,
                    "image_uri": null,
                    "list_id": 1,
                    "updated_at": 1_736_000_000_123i64
                },
                { "id": "r2", "title": "Minimal", "list_id": 1, "updated_at": 0, "priority": 9 }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let tasks = store(&server).fetch_tasks(1).await.unwrap();
    mock.assert_async().await;

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].remote_id.as_deref(), Some("r1"));
    assert!(tasks[0].is_done);
    assert_eq!(tasks[0].priority, Priority::High);
    assert_eq!(tasks[0].due_date.unwrap().timestamp_millis(), 1_736_150_400_000);
    assert_eq!(tasks[0].updated_at.timestamp_millis(), 1_736_000_000_123);

    assert_eq!(tasks[1].description, "");
    assert_eq!(tasks[1].priority, Priority::Normal);
    assert_eq!(tasks[1].due_date, None);
}

#[tokio::test]
async fn test_upsert_sends_row_and_returns_assigned_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/tasks")
        .match_header("prefer", "resolution=merge-duplicates,return=representation")
        .match_body(Matcher::PartialJson(json!({
            "title": "Buy milk",
            "priority": 2,
            "image_uri": "content://images/1",
            "list_id": 1,
            "updated_at": 1_736_000_000_123i64
        })))
        .with_status(201)
        .with_body(json!([{ "id": "new-remote-id", "title": "Buy milk", "list_id": 1, "updated_at": 1_736_000_000_123i64 }]).to_string())
        .create_async()
        .await;

    let assigned = store(&server).upsert_task(&sample_task(), 1).await.unwrap();
    mock.assert_async().await;
    assert_eq!(assigned.as_deref(), Some("new-remote-id"));
}

#[tokio::test]
async fn test_empty_upsert_response_is_invalid() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rest/v1/tasks")
        .with_status(201)
        .with_body("[]")
        .create_async()
        .await;

    let err = store(&server).upsert_task(&sample_task(), 1).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidData(_)));
}

#[tokio::test]
async fn test_delete_by_remote_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/rest/v1/tasks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "eq.r1".into()),
            Matcher::UrlEncoded("list_id".into(), "eq.4".into()),
        ]))
        .with_status(204)
        .create_async()
        .await;

    store(&server).delete_task_by_remote_id("r1", 4).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let cases = [
        (401, "auth"),
        (403, "auth"),
        (404, "not_found"),
        (500, "network"),
        (503, "network"),
        (400, "other"),
    ];

    for (status, expected) in cases {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/tasks")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body("nope")
            .create_async()
            .await;

        let err = store(&server).fetch_tasks(1).await.unwrap_err();
        let kind = match err {
            BackendError::Auth(_) => "auth",
            BackendError::NotFound(_) => "not_found",
            BackendError::Network(_) => "network",
            BackendError::InvalidData(_) => "invalid",
            BackendError::Other(_) => "other",
        };
        assert_eq!(kind, expected, "status {}", status);
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_data() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{\"not\": \"a list\"}")
        .create_async()
        .await;

    let err = store(&server).fetch_tasks(1).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidData(_)));
}

#[tokio::test]
async fn test_missing_session_never_calls_server() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let store = RestRemoteTaskStore::new(&server.url(), "anon-key".to_string(), None);
    let err = store.fetch_tasks(1).await.unwrap_err();
    assert!(matches!(err, BackendError::Auth(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_share_list_reports_refusal() {
    let mut server = Server::new_async().await;
    let accepted = server
        .mock("POST", "/rest/v1/list_members")
        .match_body(Matcher::PartialJson(json!({ "list_id": 2, "user_id": "friend" })))
        .with_status(201)
        .create_async()
        .await;
    let refused = server
        .mock("POST", "/rest/v1/list_members")
        .match_body(Matcher::PartialJson(json!({ "user_id": "stranger" })))
        .with_status(403)
        .create_async()
        .await;

    let store = store(&server);
    assert!(store.share_list(2, &["friend".to_string()]).await.unwrap());
    assert!(!store.share_list(2, &["stranger".to_string()]).await.unwrap());
    accepted.assert_async().await;
    refused.assert_async().await;
}

#[tokio::test]
async fn test_lists_and_members() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/task_lists")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!([{ "id": 1, "name": "Default" }, { "id": 2, "name": "Work" }]).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/rest/v1/task_lists")
        .match_header("prefer", "return=representation")
        .match_body(Matcher::Json(json!({ "name": "Home" })))
        .with_status(201)
        .with_body(json!([{ "id": 3, "name": "Home" }]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/list_members")
        .match_query(Matcher::UrlEncoded("list_id".into(), "eq.2".into()))
        .with_status(200)
        .with_body(json!([{ "user_id": "alice" }, { "user_id": "bob" }]).to_string())
        .create_async()
        .await;

    let store = store(&server);
    let lists = store.fetch_lists().await.unwrap();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].name, "Work");

    let created = store.create_list("Home").await.unwrap();
    assert_eq!(created.id, 3);

    let members: Vec<String> = store
        .fetch_members(2)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.user_id)
        .collect();
    assert_eq!(members, vec!["alice", "bob"]);
}

#[test]
fn test_factory_selects_backend() {
    let fake = create_remote_store(&RemoteConfig::default()).unwrap();
    assert_eq!(fake.backend_type(), "fake");

    let missing_url = RemoteConfig {
        backend: "rest".to_string(),
        ..RemoteConfig::default()
    };
    assert!(create_remote_store(&missing_url).is_err());

    let missing_key = RemoteConfig {
        backend: "rest".to_string(),
        base_url: Some("https://example.com".to_string()),
        api_key_env: "TASKSYNC_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
        ..RemoteConfig::default()
    };
    let err = create_remote_store(&missing_key).err().unwrap().to_string();
    assert!(err.contains("TASKSYNC_TEST_KEY_THAT_IS_NEVER_SET"));

    let unknown = RemoteConfig {
        backend: "ftp".to_string(),
        ..RemoteConfig::default()
    };
    assert!(create_remote_store(&unknown).is_err());
}
