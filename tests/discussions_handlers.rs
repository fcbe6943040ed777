use github_discussions_mcp::config::Config;
use github_discussions_mcp::discussions;
use github_discussions_mcp::http::{ClientError, GitHubClient};
use github_discussions_mcp::tools::{GetClientFn, ToolError, ToolOutput};
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::{json, Value};

fn client_for(server: &MockServer) -> Box<GetClientFn> {
    let cfg = Config::new("t", server.base_url());
    Box::new(move || GitHubClient::new(&cfg))
}

fn unreachable_client() -> Box<GetClientFn> {
    Box::new(|| -> Result<GitHubClient, ClientError> {
        panic!("no client should be requested for invalid parameters")
    })
}

fn parse(out: &ToolOutput) -> Value {
    assert!(!out.is_error, "unexpected tool error: {}", out.text);
    serde_json::from_str(&out.text).expect("text payload is JSON")
}

fn discussions_fixture() -> Value {
    json!([
        {
            "number": 123,
            "title": "First Discussion",
            "body": "This is the first test discussion",
            "html_url": "https://github.com/owner/repo/discussions/123",
            "created_at": "2023-01-01T00:00:00Z",
            "category_id": "1",
            "category": {"id": "1", "name": "General"},
            "answer_html_url": "https://github.com/owner/repo/discussions/123#discussioncomment-1234"
        },
        {
            "number": 456,
            "title": "Second Discussion",
            "body": "This is the second test discussion",
            "html_url": "https://github.com/owner/repo/discussions/456",
            "created_at": "2023-02-01T00:00:00Z",
            "category_id": "2",
            "category": {"id": "2", "name": "Q&A"}
        }
    ])
}

fn comments_fixture() -> Value {
    json!([
        {
            "id": 123,
            "number": 1,
            "body": "This is the first comment",
            "user": {"login": "user1"},
            "html_url": "https://github.com/owner/repo/discussions/42#discussioncomment-123"
        },
        {
            "id": 456,
            "number": 2,
            "body": "This is the second comment",
            "user": {"login": "user2"},
            "html_url": "https://github.com/owner/repo/discussions/42#discussioncomment-456"
        }
    ])
}

#[tokio::test]
async fn list_discussions_minimal_parameters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/owner/repo/discussions")
                .header("authorization", "Bearer t")
                .query_param("page", "1")
                .query_param("per_page", "30");
            then.status(200).json_body(discussions_fixture());
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::list_discussions(&*get_client, &json!({"owner": "owner", "repo": "repo"}))
        .await
        .unwrap();
    let returned = parse(&out);
    assert_eq!(returned, discussions_fixture());
    assert_eq!(returned[0]["number"], 123);
    assert_eq!(returned[0]["title"], "First Discussion");
    assert_eq!(returned[1]["number"], 456);
    assert_eq!(returned[1]["title"], "Second Discussion");
    assert_eq!(out.structured["items"], discussions_fixture());
    mock.assert_async().await;
}

#[tokio::test]
async fn list_discussions_forwards_all_filters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/owner/repo/discussions")
                .query_param("direction", "desc")
                .query_param("category", "1")
                .query_param("pinned", "true")
                .query_param("page", "1")
                .query_param("per_page", "30");
            then.status(200).json_body(discussions_fixture());
        })
        .await;

    let get_client = client_for(&server);
    let args = json!({
        "owner": "owner",
        "repo": "repo",
        "direction": "desc",
        "category_id": "1",
        "pinned": "true",
        "page": 1.0,
        "perPage": 30.0
    });
    let out = discussions::list_discussions(&*get_client, &args).await.unwrap();
    assert_eq!(parse(&out).as_array().unwrap().len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn list_discussions_reports_upstream_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/nonexistent/repo/discussions");
            then.status(404).body(r#"{"message": "Repository not found"}"#);
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::list_discussions(&*get_client, &json!({"owner": "nonexistent", "repo": "repo"}))
        .await
        .unwrap();
    assert!(out.is_error);
    assert_eq!(
        out.text,
        r#"failed to list discussions: {"message": "Repository not found"}"#
    );
    assert_eq!(out.structured["error"]["code"], "not_found");
}

#[tokio::test]
async fn list_discussions_reports_next_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/o/r/discussions");
            then.status(200)
                .header(
                    "link",
                    "<https://api.github.com/repos/o/r/discussions?page=2&per_page=30>; rel=\"next\"",
                )
                .json_body(json!([]));
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::list_discussions(&*get_client, &json!({"owner": "o", "repo": "r"}))
        .await
        .unwrap();
    let envelope = out.into_envelope(false);
    assert_eq!(envelope["structuredContent"]["meta"]["has_more"], true);
    assert_eq!(envelope["structuredContent"]["meta"]["next_page"], 2);
    assert_eq!(envelope["content"][0]["text"], "[]");
}

#[tokio::test]
async fn get_discussion_success_and_not_found() {
    let server = MockServer::start_async().await;
    let fixture = json!({
        "number": 42,
        "title": "Test Discussion",
        "body": "This is a test discussion",
        "html_url": "https://github.com/owner/repo/discussions/42",
        "category_id": "1",
        "category": {"id": "1", "name": "General"}
    });
    let body = fixture.clone();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/repos/owner/repo/discussions/42");
            then.status(200).json_body(body);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/owner/repo/discussions/999");
            then.status(404).body(r#"{"message": "Discussion not found"}"#);
        })
        .await;

    let get_client = client_for(&server);
    let ok = discussions::get_discussion(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 42.0}),
    )
    .await
    .unwrap();
    assert_eq!(parse(&ok), fixture);
    assert_eq!(ok.structured["item"]["number"], 42);

    let missing = discussions::get_discussion(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 999}),
    )
    .await
    .unwrap();
    assert!(missing.is_error);
    assert!(missing.text.starts_with("failed to get discussion: "));
    assert!(missing.text.contains("Discussion not found"));
}

#[tokio::test]
async fn get_discussion_categories_with_pagination() {
    let server = MockServer::start_async().await;
    let fixture = json!([
        {"id": "1", "name": "General", "description": "General discussions", "emoji": "💬"},
        {"id": "2", "name": "Q&A", "description": "Questions and answers", "emoji": "❓"}
    ]);
    let body = fixture.clone();
    let mock = server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/repos/owner/repo/discussions/categories")
                .query_param("page", "2")
                .query_param("per_page", "10");
            then.status(200).json_body(body);
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::get_discussion_categories(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "page": 2, "perPage": 10}),
    )
    .await
    .unwrap();
    assert_eq!(parse(&out), fixture);
    mock.assert_async().await;
}

#[tokio::test]
async fn get_discussion_categories_repository_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/nonexistent/repo/discussions/categories");
            then.status(404).body(r#"{"message": "Repository not found"}"#);
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::get_discussion_categories(
        &*get_client,
        &json!({"owner": "nonexistent", "repo": "repo"}),
    )
    .await
    .unwrap();
    assert!(out.is_error);
    assert!(out.text.starts_with("failed to get discussion categories: "));
}

#[tokio::test]
async fn get_discussion_comments_with_pagination() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/owner/repo/discussions/42/comments")
                .query_param("page", "2")
                .query_param("per_page", "10");
            then.status(200).json_body(comments_fixture());
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::get_discussion_comments(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 42, "page": 2, "perPage": 10}),
    )
    .await
    .unwrap();
    let returned = parse(&out);
    assert_eq!(returned, comments_fixture());
    assert_eq!(returned[1]["user"]["login"], "user2");
    mock.assert_async().await;
}

#[tokio::test]
async fn get_discussion_comments_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/owner/repo/discussions/999/comments");
            then.status(404).body(r#"{"message": "Discussion not found"}"#);
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::get_discussion_comments(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 999}),
    )
    .await
    .unwrap();
    assert!(out.is_error);
    assert!(out.text.starts_with("failed to get discussion comments: "));
}

#[tokio::test]
async fn add_discussion_comment_created() {
    let server = MockServer::start_async().await;
    let fixture = json!({
        "id": 123,
        "number": 1,
        "body": "This is a test comment",
        "user": {"login": "testuser"},
        "html_url": "https://github.com/owner/repo/discussions/42#discussioncomment-123"
    });
    let body = fixture.clone();
    let mock = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/repos/owner/repo/discussions/42/comments")
                .json_body(json!({"body": "This is a test comment"}));
            then.status(201).json_body(body);
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::add_discussion_comment(
        &*get_client,
        &json!({
            "owner": "owner",
            "repo": "repo",
            "discussion_number": 42,
            "body": "This is a test comment"
        }),
    )
    .await
    .unwrap();
    assert_eq!(parse(&out), fixture);
    mock.assert_async().await;
}

#[tokio::test]
async fn add_discussion_comment_empty_body_sends_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path_contains("/repos/");
            then.status(201).json_body(json!({}));
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::add_discussion_comment(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 42, "body": ""}),
    )
    .await
    .unwrap();
    assert!(out.is_error);
    assert_eq!(out.text, "missing required parameter: body");
    assert_eq!(out.structured["error"]["code"], "invalid_params");
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn add_discussion_comment_requires_created_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/repos/owner/repo/discussions/42/comments");
            then.status(200).body(r#"{"id": 1}"#);
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::add_discussion_comment(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 42, "body": "hi"}),
    )
    .await
    .unwrap();
    assert!(out.is_error);
    assert_eq!(out.text, r#"failed to create discussion comment: {"id": 1}"#);
}

#[tokio::test]
async fn create_discussion_created_and_rejected() {
    let server = MockServer::start_async().await;
    let fixture = json!({
        "number": 123,
        "title": "Test Discussion",
        "body": "This is a test discussion",
        "html_url": "https://github.com/owner/repo/discussions/123",
        "category_id": "1",
        "category": {"id": "1", "name": "General"}
    });
    let body = fixture.clone();
    let created = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/repos/owner/repo/discussions")
                .json_body(json!({
                    "title": "Test Discussion",
                    "body": "This is a test discussion",
                    "category_id": "1"
                }));
            then.status(201).json_body(body);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/repos/owner/repo/discussions")
                .json_body(json!({
                    "title": "Test Discussion",
                    "body": "This is a test discussion",
                    "category_id": "invalid"
                }));
            then.status(422).body(r#"{"message": "Invalid category ID"}"#);
        })
        .await;

    let get_client = client_for(&server);
    let mut args = json!({
        "owner": "owner",
        "repo": "repo",
        "title": "Test Discussion",
        "body": "This is a test discussion",
        "category_id": "1"
    });
    let ok = discussions::create_discussion(&*get_client, &args).await.unwrap();
    assert_eq!(parse(&ok), fixture);
    created.assert_async().await;

    args["category_id"] = json!("invalid");
    let rejected = discussions::create_discussion(&*get_client, &args).await.unwrap();
    assert!(rejected.is_error);
    assert_eq!(
        rejected.text,
        r#"failed to create discussion: {"message": "Invalid category ID"}"#
    );
    assert_eq!(rejected.structured["error"]["code"], "validation_failed");
}

async fn call(tool: &str, get_client: &GetClientFn, args: &Value) -> Result<ToolOutput, ToolError> {
    match tool {
        "list_discussions" => discussions::list_discussions(get_client, args).await,
        "get_discussion" => discussions::get_discussion(get_client, args).await,
        "get_discussion_categories" => discussions::get_discussion_categories(get_client, args).await,
        "get_discussion_comments" => discussions::get_discussion_comments(get_client, args).await,
        "add_discussion_comment" => discussions::add_discussion_comment(get_client, args).await,
        "create_discussion" => discussions::create_discussion(get_client, args).await,
        other => panic!("unknown tool {other}"),
    }
}

#[tokio::test]
async fn missing_required_parameters_never_reach_the_network() {
    let get_client = unreachable_client();
    let cases = [
        ("list_discussions", json!({"owner": "o", "repo": "r"})),
        ("get_discussion", json!({"owner": "o", "repo": "r", "discussion_number": 1})),
        ("get_discussion_categories", json!({"owner": "o", "repo": "r"})),
        ("get_discussion_comments", json!({"owner": "o", "repo": "r", "discussion_number": 1})),
        (
            "add_discussion_comment",
            json!({"owner": "o", "repo": "r", "discussion_number": 1, "body": "b"}),
        ),
        (
            "create_discussion",
            json!({"owner": "o", "repo": "r", "title": "t", "body": "b", "category_id": "1"}),
        ),
    ];
    for (tool, complete) in cases {
        let names: Vec<String> = complete.as_object().unwrap().keys().cloned().collect();
        for missing in names {
            let mut args = complete.clone();
            args.as_object_mut().unwrap().remove(&missing);
            let out = call(tool, &*get_client, &args).await.unwrap();
            assert!(out.is_error, "{tool} accepted arguments without {missing}");
            assert_eq!(out.text, format!("missing required parameter: {missing}"));
        }
    }
}

#[tokio::test]
async fn fractional_discussion_number_is_truncated() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/owner/repo/discussions/42");
            then.status(200).json_body(json!({"number": 42}));
        })
        .await;

    let get_client = client_for(&server);
    let out = discussions::get_discussion(
        &*get_client,
        &json!({"owner": "owner", "repo": "repo", "discussion_number": 42.5}),
    )
    .await
    .unwrap();
    assert_eq!(parse(&out)["number"], 42);
    mock.assert_async().await;

    let negative = discussions::get_discussion(
        &*unreachable_client(),
        &json!({"owner": "owner", "repo": "repo", "discussion_number": -3}),
    )
    .await
    .unwrap();
    assert!(negative.is_error);
    assert_eq!(negative.text, "parameter discussion_number is out of range");
}

#[tokio::test]
async fn null_fields_survive_unchanged() {
    let server = MockServer::start_async().await;
    let fixture = json!({
        "number": 42,
        "title": "T",
        "answer_chosen_at": null,
        "body": null,
        "category": {"id": 1, "name": "General", "description": null},
        "user": {"login": "octocat", "name": null},
        "extra_field": null
    });
    let body = fixture.clone();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/repos/owner/repo/discussions/42");
            then.status(200).json_body(body);
        })
        .await;
    let comments = json!([{"id": 7, "body": "hi", "user": null, "updated_at": null}]);
    let comments_body = comments.clone();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/repos/owner/repo/discussions/42/comments");
            then.status(200).json_body(comments_body);
        })
        .await;

    let get_client = client_for(&server);
    let args = json!({"owner": "owner", "repo": "repo", "discussion_number": 42});
    let out = discussions::get_discussion(&*get_client, &args).await.unwrap();
    assert_eq!(parse(&out), fixture);
    assert_eq!(out.structured["item"], fixture);

    let out = discussions::get_discussion_comments(&*get_client, &args).await.unwrap();
    assert_eq!(parse(&out), comments);
    assert_eq!(out.structured["items"], comments);
}

#[tokio::test]
async fn wrong_parameter_type_is_a_tool_error() {
    let get_client = unreachable_client();
    let out = discussions::list_discussions(&*get_client, &json!({"owner": "o", "repo": 5}))
        .await
        .unwrap();
    assert!(out.is_error);
    assert_eq!(out.text, "parameter repo is not of type string");
}

#[tokio::test]
async fn transport_failure_is_a_hard_error() {
    let cfg = Config::new("t", "http://127.0.0.1:1");
    let get_client: Box<GetClientFn> = Box::new(move || GitHubClient::new(&cfg));
    let err = discussions::get_discussion(
        &*get_client,
        &json!({"owner": "o", "repo": "r", "discussion_number": 1}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ToolError::Upstream { .. }));
    assert!(err.to_string().starts_with("failed to get discussion: "));
}
