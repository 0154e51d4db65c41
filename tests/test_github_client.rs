mod common;

use blivate::storage::client::{ContentClient, EntryKind, NewRepository};
use blivate::StoreError;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_file_decodes_wrapped_base64() {
    let server = MockServer::start().await;
    let text = "---\ntitle: \"Hello\"\ntags: []\n---\nA body long enough to wrap the base64 payload over several lines.";

    Mock::given(method("GET"))
        .and(path(common::contents_path("blogs/hello-1.md")))
        .and(query_param("ref", "main"))
        .and(header("authorization", format!("Bearer {}", common::TOKEN).as_str()))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::contents_json("blogs/hello-1.md", "abc123", text)),
        )
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    let file = client.get_file("blogs/hello-1.md").await.unwrap().unwrap();

    assert_eq!(file.revision, "abc123");
    assert_eq!(file.path, "blogs/hello-1.md");
    assert_eq!(String::from_utf8(file.content).unwrap(), text);
}

#[tokio::test]
async fn missing_file_and_directory_are_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    assert!(client.get_file("blogs/nope-1.md").await.unwrap().is_none());
    assert!(client.list_dir("blogs").await.unwrap().is_empty());
    assert!(client.get_repository().await.unwrap().is_none());
}

#[tokio::test]
async fn put_sends_revision_and_branch() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(common::contents_path("blogs/hello-1.md")))
        .and(body_partial_json(serde_json::json!({
            "message": "Update post: Hello",
            "content": "aGVsbG8=",
            "sha": "old-sha",
            "branch": "main",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": { "sha": "new-sha", "path": "blogs/hello-1.md" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    let revision = client
        .put_file(
            "blogs/hello-1.md",
            b"hello".to_vec(),
            "Update post: Hello",
            Some("old-sha".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(revision, "new-sha");
}

async fn put(client: &impl ContentClient, file: &str) -> Result<String, StoreError> {
    client.put_file(file, b"x".to_vec(), "m", None).await
}

#[tokio::test]
async fn conflicts_map_to_concurrent_modification() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(common::contents_path("blogs/a-1.md")))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "message": "blogs/a-1.md does not match 0123abcd"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(common::contents_path("blogs/b-1.md")))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(common::contents_path("blogs/c-1.md")))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "Invalid request."
        })))
        .mount(&server)
        .await;

    let client = common::github_client(&server);

    assert!(matches!(
        put(&client, "blogs/a-1.md").await,
        Err(StoreError::ConcurrentModification { .. })
    ));
    assert!(matches!(
        put(&client, "blogs/b-1.md").await,
        Err(StoreError::ConcurrentModification { .. })
    ));
    assert!(matches!(
        put(&client, "blogs/c-1.md").await,
        Err(StoreError::Transport {
            status: Some(422),
            ..
        })
    ));
}

#[tokio::test]
async fn delete_sends_revision() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(common::contents_path("blogs/gone-1.md")))
        .and(body_partial_json(serde_json::json!({
            "message": "Delete post: gone-1",
            "sha": "abc",
            "branch": "main",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    client
        .delete_file("blogs/gone-1.md", "abc", "Delete post: gone-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn list_dir_parses_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::contents_path("blogs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "a-1.md", "path": "blogs/a-1.md", "type": "file", "sha": "1" },
            { "name": "drafts", "path": "blogs/drafts", "type": "dir", "sha": "2" },
            { "name": "link", "path": "blogs/link", "type": "symlink", "sha": "3" },
        ])))
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    let entries = client.list_dir("blogs").await.unwrap();
    let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EntryKind::File, EntryKind::Dir, EntryKind::Other]);
    assert!(entries[0].is_file());
}

#[tokio::test]
async fn create_repository_posts_to_user_repos() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_partial_json(serde_json::json!({
            "name": common::REPOSITORY,
            "private": false,
            "auto_init": true,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "name": common::REPOSITORY,
            "full_name": format!("{}/{}", common::OWNER, common::REPOSITORY),
            "private": false,
            "default_branch": "main",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    let info = client
        .create_repository(&NewRepository {
            name: common::REPOSITORY.to_string(),
            description: "posts".to_string(),
            private: false,
            auto_init: true,
        })
        .await
        .unwrap();
    assert_eq!(info.full_name, "octocat/blivate-blog-posts");
}

#[tokio::test]
async fn server_errors_are_transport_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = common::github_client(&server);
    let err = client.get_file("blogs/a-1.md").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Transport {
            status: Some(502),
            ..
        }
    ));
}
