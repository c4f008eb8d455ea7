//! The bot against real HTTP: an unreachable API root and a mock Bot API server (mockito).

mod common;

use bot_api::ErrorKind;
use common::{create_http_bot, make_update, TEST_TOKEN, UNREACHABLE_API_URL};
use mockito::Matcher;
use retry_bot::Poller;

fn path(method: &str) -> String {
    format!("/bot{}/{}", TEST_TOKEN, method)
}

/// **Test: Connection refused is a network error retried max_retry_attempts times.**
///
/// **Setup:** API root `http://127.0.0.1:1`; max_retry_attempts=1; 10 ms backoff.
/// **Action:** `/send_message` and `/conv_message`.
/// **Expected:** 2 attempts each; terminal transport error without the token in its text.
#[tokio::test]
async fn test_unreachable_api_root() {
    for command in ["/send_message", "/conv_message"] {
        let (bot, recorder) = create_http_bot(UNREACHABLE_API_URL, 1);

        let err = bot.handle_update(&make_update(command, 1)).await.unwrap_err();

        assert_eq!(err.as_api_error().map(|e| e.kind()), Some(ErrorKind::Transport));
        assert_eq!(recorder.methods(), vec!["sendMessage", "sendMessage"]);
        assert!(!err.to_string().contains("TEST_TOKEN"));
    }
}

/// **Test: 500 responses are retried; the photo payload is sent each time.**
#[tokio::test]
async fn test_server_error_retried_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", path("sendPhoto").as_str())
        .match_body(Matcher::PartialJsonString(
            r#"{"chat_id": 1, "photo": "https://picsum.photos/200/300", "caption": "Photo sent inside conversation"}"#
                .to_string(),
        ))
        .with_status(500)
        .with_body(r#"{"ok": false, "error_code": 500, "description": "Internal Server Error"}"#)
        .expect(3)
        .create_async()
        .await;

    let (bot, recorder) = create_http_bot(&server.url(), 2);
    let err = bot.handle_update(&make_update("/conv_photo", 1)).await.unwrap_err();

    assert_eq!(err.as_api_error().and_then(|e| e.error_code()), Some(500));
    assert_eq!(recorder.count(), 3);
    mock.assert_async().await;
}

/// **Test: One poll dispatches the batch in order and advances the offset past the last update.**
///
/// **Setup:** getUpdates returns `/send_message` (7) and plain text (8).
/// **Action:** `poll_once` twice.
/// **Expected:** one sendMessage; offset 9; the second poll sends offset 9.
#[tokio::test]
async fn test_poll_once_dispatches_and_advances_offset() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", path("getUpdates").as_str())
        .with_status(200)
        .with_body(
            r#"{"ok": true, "result": [
                {"update_id": 7, "message": {"message_id": 1, "date": 0,
                    "chat": {"id": 42, "type": "private"}, "text": "/send_message"}},
                {"update_id": 8, "message": {"message_id": 2, "date": 0,
                    "chat": {"id": 42, "type": "private"}, "text": "hello"}}
            ]}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let reply = server
        .mock("POST", path("sendMessage").as_str())
        .match_body(Matcher::PartialJsonString(
            r#"{"chat_id": 42, "text": "Message sent without conversation"}"#.to_string(),
        ))
        .with_status(200)
        .with_body(
            r#"{"ok": true, "result": {"message_id": 3, "date": 0,
                "chat": {"id": 42, "type": "private"}, "text": "Message sent without conversation"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let (bot, _recorder) = create_http_bot(&server.url(), 0);
    let mut poller = Poller::new(bot, 0);

    assert_eq!(poller.poll_once().await.unwrap(), 2);
    assert_eq!(poller.offset(), Some(9));
    first.assert_async().await;
    reply.assert_async().await;
    first.remove_async().await;

    let second = server
        .mock("POST", path("getUpdates").as_str())
        .match_body(Matcher::PartialJsonString(r#"{"offset": 9}"#.to_string()))
        .with_status(200)
        .with_body(r#"{"ok": true, "result": []}"#)
        .expect(1)
        .create_async()
        .await;

    assert_eq!(poller.poll_once().await.unwrap(), 0);
    assert_eq!(poller.offset(), Some(9));
    second.assert_async().await;
}
