//! Integration tests for the daemon lifecycle.
//!
//! Each test builds a daemon over in-memory storage with a fake remote,
//! runs the event loop in the background and watches the event bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use quoter_client::error::{Error, Result};
use quoter_client::storage::MemoryStorage;
use quoter_client::sync::{RemotePost, RemoteSource};
use quoter_client::{CategoryFilter, Quote, QuoteStore, Settings};
use quoter_daemon::{CategoryComponent, Daemon, DaemonEvent, DaemonHandle, SyncComponent};
use tempfile::TempDir;
use tokio::sync::broadcast;

#[derive(Default)]
struct FakeRemote {
    titles: Vec<&'static str>,
    fail: AtomicBool,
    fetches: AtomicUsize,
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn fetch(&self) -> Result<Vec<RemotePost>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Remote("503 Service Unavailable".into()));
        }
        Ok(self
            .titles
            .iter()
            .map(|title| RemotePost {
                id: None,
                title: (*title).to_string(),
                body: None,
            })
            .collect())
    }

    async fn push(&self, _quotes: &[Quote]) -> Result<()> {
        Ok(())
    }
}

fn test_settings(tmp: &TempDir, enabled: bool) -> Settings {
    Settings::builder()
        .expect("could not build settings builder")
        .set_override("data_dir", tmp.path().to_str().unwrap())
        .expect("failed to set data_dir")
        .set_override("session_dir", tmp.path().join("session").to_str().unwrap())
        .expect("failed to set session_dir")
        // Long enough that only the initial tick fires during a test
        .set_override("sync.frequency", 3600)
        .expect("failed to set sync.frequency")
        .set_override("sync.policy", "append-new")
        .expect("failed to set sync.policy")
        .set_override("sync.enabled", enabled)
        .expect("failed to set sync.enabled")
        .build()
        .expect("could not build settings")
        .try_deserialize()
        .expect("could not deserialize settings")
}

struct TestDaemon {
    handle: DaemonHandle,
    events: broadcast::Receiver<DaemonEvent>,
    index: Arc<tokio::sync::RwLock<quoter_client::CategoryIndex>>,
    durable: MemoryStorage,
    event_loop: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

async fn start_test_daemon(remote: Arc<FakeRemote>, enabled: bool) -> TestDaemon {
    let tmp = tempfile::tempdir().unwrap();
    let settings = test_settings(&tmp, enabled);

    let durable = MemoryStorage::new();
    let mut store = QuoteStore::open(durable.clone(), MemoryStorage::new());
    store.append(Quote::new("A", "X")).unwrap();

    let category = CategoryComponent::new();
    let index = category.index();

    let mut daemon = Daemon::builder(settings)
        .store(store)
        .component(category)
        .component(SyncComponent::with_remote(remote))
        .build()
        .unwrap();

    let handle = daemon.handle();
    let events = handle.subscribe();

    daemon.start_components().await.unwrap();

    let event_loop = tokio::spawn(async move {
        daemon.run_event_loop().await.unwrap();
        daemon.stop_components().await;
    });

    TestDaemon {
        handle,
        events,
        index,
        durable,
        event_loop,
        _tmp: tmp,
    }
}

/// Wait for the first event matching `pred`, failing after a few seconds.
async fn wait_for(
    events: &mut broadcast::Receiver<DaemonEvent>,
    pred: impl Fn(&DaemonEvent) -> bool,
) -> DaemonEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn test_initial_sync_merges_remote() {
    let remote = Arc::new(FakeRemote {
        titles: vec!["A", "B"],
        ..FakeRemote::default()
    });
    let mut daemon = start_test_daemon(remote.clone(), true).await;

    let event = wait_for(&mut daemon.events, |e| {
        matches!(e, DaemonEvent::SyncCompleted { .. })
    })
    .await;

    match event {
        DaemonEvent::SyncCompleted {
            fetched,
            added,
            pushed,
        } => {
            assert_eq!((fetched, added, pushed), (2, 1, 0));
        }
        other => panic!("unexpected event {other:?}"),
    }

    assert_eq!(
        daemon.handle.store().lock().await.quotes(),
        [Quote::new("A", "X"), Quote::new("B", "Server")]
    );

    // The persisted copy matches what is in memory
    let reopened = QuoteStore::open(daemon.durable.clone(), MemoryStorage::new());
    assert_eq!(reopened.len(), 2);
    assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);

    daemon.handle.shutdown();
    daemon.event_loop.await.unwrap();
}

#[tokio::test]
async fn test_category_index_follows_changes() {
    let remote = Arc::new(FakeRemote {
        titles: vec!["B"],
        ..FakeRemote::default()
    });
    let mut daemon = start_test_daemon(remote, true).await;

    wait_for(&mut daemon.events, |e| {
        matches!(e, DaemonEvent::SyncCompleted { .. })
    })
    .await;

    // The index is rebuilt by the event loop, after the change is broadcast
    tokio::time::timeout(Duration::from_secs(5), async {
        while !daemon.index.read().await.contains("Server") {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("category index never saw the synced quote");

    assert_eq!(daemon.index.read().await.categories(), ["X", "Server"]);

    daemon.handle.shutdown();
    daemon.event_loop.await.unwrap();
}

#[tokio::test]
async fn test_failed_sync_leaves_store() {
    let remote = Arc::new(FakeRemote {
        titles: vec!["B"],
        ..FakeRemote::default()
    });
    remote.fail.store(true, Ordering::SeqCst);
    let mut daemon = start_test_daemon(remote.clone(), true).await;

    let event = wait_for(&mut daemon.events, |e| {
        matches!(e, DaemonEvent::SyncFailed { .. })
    })
    .await;
    assert!(matches!(event, DaemonEvent::SyncFailed { error } if error.contains("503")));

    assert_eq!(
        daemon.handle.store().lock().await.quotes(),
        [Quote::new("A", "X")]
    );

    // A forced sync after the remote recovers goes through
    remote.fail.store(false, Ordering::SeqCst);
    daemon.handle.emit(DaemonEvent::ForceSync);

    wait_for(&mut daemon.events, |e| {
        matches!(e, DaemonEvent::SyncCompleted { .. })
    })
    .await;
    assert_eq!(daemon.handle.store().lock().await.len(), 2);
    assert_eq!(remote.fetches.load(Ordering::SeqCst), 2);

    daemon.handle.shutdown();
    daemon.event_loop.await.unwrap();
}

#[tokio::test]
async fn test_selected_category_is_remembered() {
    let remote = Arc::new(FakeRemote::default());
    let daemon = start_test_daemon(remote.clone(), false).await;

    daemon
        .handle
        .emit(DaemonEvent::CategorySelected(CategoryFilter::Only("X".into())));

    tokio::time::timeout(Duration::from_secs(5), async {
        while daemon.handle.store().lock().await.last_category() == CategoryFilter::All {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("category was never remembered");

    assert_eq!(
        daemon.handle.store().lock().await.last_category(),
        CategoryFilter::Only("X".into())
    );

    // Sync is disabled, so nothing was ever fetched
    daemon.handle.shutdown();
    daemon.event_loop.await.unwrap();
    assert_eq!(remote.fetches.load(Ordering::SeqCst), 0);
}
