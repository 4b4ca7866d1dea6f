// tests/slack_notify.rs
use keycloak_notifier::notify::{DispatchError, Notifier, SlackNotifier};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_channel_and_text_exactly_once() {
    let server = MockServer::start().await;
    let text = "New users\n- alice a@x.com (since 2.00 hrs)";
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-test"))
        .and(body_json(serde_json::json!({
            "channel": "#onboarding",
            "text": text
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = SlackNotifier::new("xoxb-test".into()).with_base_url(server.uri());
    notifier.post_message("#onboarding", text).await.unwrap();
}

#[tokio::test]
async fn in_band_failure_surfaces_as_api_error() {
    let server = MockServer::start().await;
    // Slack reports failures with HTTP 200 and ok=false.
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": false,
            "error": "channel_not_found"
        })))
        .mount(&server)
        .await;

    let notifier = SlackNotifier::new("xoxb-test".into()).with_base_url(server.uri());
    let err = notifier.post_message("#nowhere", "hi").await.unwrap_err();
    match err {
        DispatchError::Api(reason) => assert_eq!(reason, "channel_not_found"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_surfaces_as_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let notifier = SlackNotifier::new("xoxb-test".into()).with_base_url(server.uri());
    let err = notifier.post_message("#onboarding", "hi").await.unwrap_err();
    assert!(matches!(err, DispatchError::Status(s) if s.as_u16() == 503));
}
