// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline: filesystem catalog, event router, content dispatcher
//! and a mock platform, wired the way `serve` wires them.

use std::sync::Arc;
use std::time::Duration;

use commbot_catalog::{CatalogCache, CatalogSettings};
use commbot_config::model::{CatalogConfig, CatalogStoreKind};
use commbot_content::{DispatcherSettings, RequestDispatcher};
use commbot_core::MediaKind;
use commbot_test_utils::MockPlatform;
use commbot_test_utils::fixtures::{self, COMMANDS_CSV, COMMANDS_WITHOUT_7_CSV, PHRASES_CSV};
use commbot_vk::{ChatEvent, EventRouter, RouterSettings};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const PEER: i64 = 2_000_000_001;

fn message(from_id: i64, text: &str) -> ChatEvent {
    ChatEvent::Message {
        peer_id: PEER,
        from_id,
        text: text.into(),
    }
}

#[tokio::test]
async fn chat_commands_are_served_from_a_file_catalog() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("phrases.csv"), PHRASES_CSV).unwrap();
    std::fs::write(dir.path().join("commands.csv"), COMMANDS_CSV).unwrap();

    let config = commbot_config::load_and_validate_str("").unwrap();
    let catalog_config = CatalogConfig {
        store: CatalogStoreKind::Fs,
        root_dir: Some(dir.path().display().to_string()),
        ..CatalogConfig::default()
    };
    let store = commbot_storage::open_store(&catalog_config).unwrap();
    let catalog = Arc::new(
        CatalogCache::load(store, CatalogSettings::from(&catalog_config))
            .await
            .unwrap(),
    );

    let platform = Arc::new(MockPlatform::new());
    platform
        .set_wall("music_club", fixtures::wall(MediaKind::Audio, 5))
        .await;
    platform
        .set_wall("art_club", fixtures::wall(MediaKind::Photo, 5))
        .await;

    let cancel = CancellationToken::new();
    let (dispatcher, requests) = RequestDispatcher::new(
        catalog.clone(),
        platform.clone(),
        DispatcherSettings::from(&config),
    );
    let router = EventRouter::new(
        catalog.clone(),
        platform.clone(),
        requests,
        RouterSettings::from(&config),
    );
    let (events, events_rx) = mpsc::channel(16);
    let dispatcher_task = tokio::spawn(dispatcher.run(cancel.clone()));
    let router_task = tokio::spawn(router.run(events_rx, cancel.clone()));

    events.send(message(5, "pic")).await.unwrap();
    let sent = platform.wait_for_sent(1).await;
    assert!(sent[0].attachment.as_deref().unwrap().starts_with("photo-1_"));

    events.send(message(5, "rules")).await.unwrap();
    let sent = platform.wait_for_sent(2).await;
    assert_eq!(
        sent[1].message.as_deref(),
        Some("@id5, \n\nBe kind to each other")
    );

    // Drop command 7 from the catalog on disk and publish it.
    std::fs::write(dir.path().join("commands.csv"), COMMANDS_WITHOUT_7_CSV).unwrap();
    catalog.refresh_now().await.unwrap();
    assert!(catalog.find_command_by_alias("song").await.is_none());

    events.send(message(5, "song")).await.unwrap();
    events.send(message(5, "pic")).await.unwrap();
    let sent = platform.wait_for_sent(3).await;
    assert_eq!(sent.len(), 3);
    assert!(sent[2].attachment.as_deref().unwrap().starts_with("photo-1_"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(platform.sent_count().await, 3);

    cancel.cancel();
    dispatcher_task.await.unwrap();
    router_task.await.unwrap();
}
