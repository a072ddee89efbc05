// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long poll bridge against a mock VK server.

use std::sync::Arc;
use std::time::Duration;

use commbot_vk::{ChatEvent, LongPollBridge, VkClient};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_server_handshake(server: &MockServer, ts: &str, times: Option<u64>) {
    let mock = Mock::given(method("POST"))
        .and(path("/groups.getLongPollServer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"key": "k", "server": format!("{}/lp", server.uri()), "ts": ts}
        })));
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(server).await;
}

/// Answers polls at `ts` with nothing, slowly, so an idle bridge does not spin.
async fn mount_idle_poll(server: &MockServer, ts: &str) {
    Mock::given(method("GET"))
        .and(path("/lp"))
        .and(query_param("ts", ts))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ts": ts, "updates": []}))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(server)
        .await;
}

fn message_update(from_id: i64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message_new",
        "object": {"message": {"peer_id": 2000000001, "from_id": from_id, "text": text}}
    })
}

fn spawn_bridge(
    server: &MockServer,
) -> (
    mpsc::Receiver<ChatEvent>,
    CancellationToken,
    tokio::task::JoinHandle<()>,
) {
    let client = Arc::new(VkClient::new("group-token", server.uri(), "5.199").unwrap());
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let bridge = LongPollBridge::new(client, 77, 1, tx);
    let task = tokio::spawn(bridge.run(cancel.clone()));
    (rx, cancel, task)
}

#[tokio::test]
async fn updates_are_forwarded_and_ts_advances() {
    let server = MockServer::start().await;
    mount_server_handshake(&server, "1", None).await;
    Mock::given(method("GET"))
        .and(path("/lp"))
        .and(query_param("act", "a_check"))
        .and(query_param("key", "k"))
        .and(query_param("ts", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ts": 2,
            "updates": [message_update(5, "song")]
        })))
        .mount(&server)
        .await;
    mount_idle_poll(&server, "2").await;

    let (mut rx, cancel, task) = spawn_bridge(&server);

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        ChatEvent::Message {
            peer_id: 2_000_000_001,
            from_id: 5,
            text: "song".into()
        }
    );

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn expired_key_reacquires_the_server() {
    let server = MockServer::start().await;
    // First handshake hands out ts=1, every later one ts=5.
    mount_server_handshake(&server, "1", Some(1)).await;
    mount_server_handshake(&server, "5", None).await;
    Mock::given(method("GET"))
        .and(path("/lp"))
        .and(query_param("ts", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"failed": 2})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lp"))
        .and(query_param("ts", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ts": "6",
            "updates": [message_update(7, "rules")]
        })))
        .mount(&server)
        .await;
    mount_idle_poll(&server, "6").await;

    let (mut rx, cancel, task) = spawn_bridge(&server);

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, ChatEvent::Message { from_id: 7, .. }));

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn lost_history_continues_from_supplied_ts() {
    let server = MockServer::start().await;
    mount_server_handshake(&server, "1", None).await;
    Mock::given(method("GET"))
        .and(path("/lp"))
        .and(query_param("ts", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"failed": 1, "ts": 9})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lp"))
        .and(query_param("ts", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ts": "10",
            "updates": [message_update(8, "pic")]
        })))
        .mount(&server)
        .await;
    mount_idle_poll(&server, "10").await;

    let (mut rx, cancel, task) = spawn_bridge(&server);

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, ChatEvent::Message { from_id: 8, .. }));

    cancel.cancel();
    task.await.unwrap();
}
