// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the refreshing catalog cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use commbot_catalog::{
    CatalogCache, CatalogSettings, parse_commands, write_commands_csv,
};
use commbot_core::{CommandId, CommbotError, PhraseKind};
use commbot_test_utils::MemoryObjectStore;
use commbot_test_utils::fixtures::{
    COMMANDS_CSV, COMMANDS_KEY, COMMANDS_WITHOUT_7_CSV, PHRASES_CSV, PHRASES_KEY,
};
use tracing_test::traced_test;

const INTERVAL: Duration = Duration::from_secs(900);

fn settings() -> CatalogSettings {
    CatalogSettings {
        phrases_key: PHRASES_KEY.into(),
        commands_key: COMMANDS_KEY.into(),
        phrases_refresh_interval: INTERVAL,
        commands_refresh_interval: INTERVAL,
    }
}

fn store() -> Arc<MemoryObjectStore> {
    Arc::new(MemoryObjectStore::with_objects([
        (PHRASES_KEY, PHRASES_CSV),
        (COMMANDS_KEY, COMMANDS_CSV),
    ]))
}

#[tokio::test]
async fn initial_load_requires_both_tables() {
    let store = Arc::new(MemoryObjectStore::with_objects([(PHRASES_KEY, PHRASES_CSV)]));
    let result = CatalogCache::load(store, settings()).await;
    assert!(matches!(result, Err(CommbotError::CatalogFetch { ref key, .. }) if key == COMMANDS_KEY));
}

#[tokio::test]
async fn initial_load_rejects_malformed_table() {
    let store = Arc::new(MemoryObjectStore::with_objects([
        (PHRASES_KEY, "phrase_id,weight,phrase_type,vk_audio_id,vk_gif_id,text\n1,1,NOPE,,,x\n"),
        (COMMANDS_KEY, COMMANDS_CSV),
    ]));
    let result = CatalogCache::load(store, settings()).await;
    match result {
        Err(CommbotError::CatalogParse { key, message }) => {
            assert_eq!(key, PHRASES_KEY);
            assert!(message.contains("line 2"), "message: {message}");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed table loaded"),
    }
}

#[tokio::test]
async fn alias_lookup_is_case_folded() {
    let catalog = CatalogCache::load(store(), settings()).await.unwrap();

    let sing = catalog.find_command_by_alias("sing").await.unwrap();
    assert_eq!(sing.id(), CommandId(7));
    assert_eq!(
        catalog.find_command_by_alias("SONG").await.unwrap().id(),
        CommandId(7)
    );
    assert!(catalog.find_command_by_alias("si ng").await.is_none());
    assert!(
        catalog
            .find_command_by_alias("a much longer chat message than any alias")
            .await
            .is_none()
    );
}

#[tokio::test]
async fn lookups_by_id_and_kind() {
    let catalog = CatalogCache::load(store(), settings()).await.unwrap();

    assert!(catalog.find_command_by_id(CommandId(8)).await.is_some());
    assert!(catalog.find_command_by_id(CommandId(70)).await.is_none());

    let ids: Vec<u32> = catalog
        .find_all_commands()
        .await
        .iter()
        .map(|c| c.id().0)
        .collect();
    assert_eq!(ids, vec![7, 8, 9]);

    let retry = catalog.find_phrases_by_kind(PhraseKind::Retry).await;
    assert_eq!(retry.len(), 1);
    assert!(retry[0].is_user_templated());

    let picked = catalog.pick_phrase(PhraseKind::ContentResponse).await.unwrap();
    assert_eq!(picked.text, "Enjoy!");
}

#[tokio::test(start_paused = true)]
async fn refresh_happens_once_interval_elapses() {
    let store = store();
    let catalog = CatalogCache::load(store.clone(), settings()).await.unwrap();
    store.put(COMMANDS_KEY, COMMANDS_WITHOUT_7_CSV).await;

    tokio::time::advance(INTERVAL - Duration::from_secs(1)).await;
    assert!(catalog.find_command_by_id(CommandId(7)).await.is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(catalog.find_command_by_id(CommandId(7)).await.is_none());
    assert!(catalog.command_ids().await.contains(&CommandId(9)));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn failed_refresh_keeps_snapshot_and_retries() {
    let store = store();
    let catalog = CatalogCache::load(store.clone(), settings()).await.unwrap();
    let loads = store.fetch_count();

    store.set_failing(true);
    tokio::time::advance(INTERVAL + Duration::from_secs(1)).await;

    assert!(catalog.find_command_by_id(CommandId(7)).await.is_some());
    assert!(logs_contain("catalog refresh failed"));
    assert_eq!(store.fetch_count(), loads + 1);

    // The timestamp was not advanced, so the next lookup tries again.
    assert!(catalog.find_command_by_alias("sing").await.is_some());
    assert_eq!(store.fetch_count(), loads + 2);

    store.set_failing(false);
    store.put(COMMANDS_KEY, COMMANDS_WITHOUT_7_CSV).await;
    assert!(catalog.find_command_by_id(CommandId(7)).await.is_none());
    assert_eq!(store.fetch_count(), loads + 3);

    // Fresh again: no fetch until the next interval.
    assert!(catalog.find_command_by_id(CommandId(8)).await.is_some());
    assert_eq!(store.fetch_count(), loads + 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_keep_the_old_snapshot_while_one_caller_refreshes() {
    let store = store();
    let short = CatalogSettings {
        commands_refresh_interval: Duration::from_millis(20),
        ..settings()
    };
    let catalog = Arc::new(CatalogCache::load(store.clone(), short).await.unwrap());
    let loads = store.fetch_count();

    store.put(COMMANDS_KEY, COMMANDS_WITHOUT_7_CSV).await;
    store.set_fetch_delay(Duration::from_millis(500));
    tokio::time::sleep(Duration::from_millis(40)).await;

    let refresher = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { catalog.find_command_by_id(CommandId(7)).await })
    };
    // Let the refresher take the lock and start its slow fetch.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.fetch_count(), loads + 1);

    let started = std::time::Instant::now();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.find_command_by_id(CommandId(7)).await })
        })
        .collect();
    for reader in readers {
        assert!(reader.await.unwrap().is_some(), "reader saw the new table");
    }
    assert!(
        started.elapsed() < Duration::from_millis(250),
        "readers waited {:?} for the refresh",
        started.elapsed()
    );

    assert!(refresher.await.unwrap().is_none());
    assert_eq!(store.fetch_count(), loads + 1);
}

#[tokio::test]
async fn refresh_now_publishes_new_snapshot() {
    let store = store();
    let catalog = CatalogCache::load(store.clone(), settings()).await.unwrap();
    let before = catalog.snapshot().await;

    store.put(COMMANDS_KEY, COMMANDS_WITHOUT_7_CSV).await;
    catalog.refresh_now().await.unwrap();

    let after = catalog.snapshot().await;
    assert!(before.commands.find_by_id(CommandId(7)).is_some());
    assert!(after.commands.find_by_id(CommandId(7)).is_none());
    assert!(after.commands.find_by_alias("sing").is_none());

    store.set_failing(true);
    assert!(catalog.refresh_now().await.is_err());
    assert!(catalog.find_command_by_id(CommandId(9)).await.is_some());
}

#[test]
fn command_table_survives_reencoding() {
    let commands = parse_commands(COMMANDS_CSV.as_bytes()).unwrap();
    let encoded = write_commands_csv(&commands).unwrap();
    let reparsed = parse_commands(encoded.as_bytes()).unwrap();

    let semantic = |list: &[commbot_core::Command]| -> BTreeMap<u32, (BTreeSet<String>, String)> {
        list.iter()
            .map(|c| {
                (
                    c.id().0,
                    (c.aliases().clone(), format!("{:?}", c.content())),
                )
            })
            .collect()
    };
    assert_eq!(semantic(&commands), semantic(&reparsed));
}
