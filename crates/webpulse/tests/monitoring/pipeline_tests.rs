use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use webpulse::models::{LastChecked, SiteStatus};
use webpulse::monitoring::{Batcher, Prober, Scheduler, WorkerPool};
use webpulse::queue::channel;
use webpulse::registry::{MemoryRegistry, Registry};

use crate::common::{FlakyRegistry, ScriptedChecker};

#[tokio::test]
async fn test_one_cycle_tracks_reachability() {
    let registry = Arc::new(MemoryRegistry::new());
    let checker = Arc::new(ScriptedChecker::new());
    let (queue, mut receiver) = channel(64);
    let batcher = Batcher::new(registry.clone(), Arc::new(queue), 10);
    let prober = Prober::new(registry.clone(), checker.clone());

    registry.register("a.com").await.unwrap();
    let fresh = registry.get("a.com").await.unwrap();
    assert_eq!(fresh.status, SiteStatus::Unknown);
    assert_eq!(fresh.last_checked, LastChecked::Never);

    checker.respond("http://a.com", 200);
    batcher.run().await.unwrap();
    let delivery = receiver.try_next_delivery(10).unwrap();
    prober.handle_delivery(delivery).await;

    let up = registry.get("a.com").await.unwrap();
    assert_eq!(up.status, SiteStatus::Up);
    assert!(matches!(up.last_checked, LastChecked::At(_)));

    checker.go_dark("http://a.com");
    batcher.run().await.unwrap();
    let delivery = receiver.try_next_delivery(10).unwrap();
    prober.handle_delivery(delivery).await;

    let down = registry.get("a.com").await.unwrap();
    assert_eq!(down.status, SiteStatus::Down);
    assert!(down.last_checked >= up.last_checked);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_scheduled_pipeline_probes_until_shutdown() {
    let registry = Arc::new(MemoryRegistry::new());
    registry.register("a.com").await.unwrap();
    registry.register("https://b.org/health").await.unwrap();

    let checker = Arc::new(ScriptedChecker::new());
    checker.respond("http://a.com", 200);

    let (queue, receiver) = channel(64);
    let batcher = Arc::new(Batcher::new(registry.clone(), Arc::new(queue), 10));
    let prober = Arc::new(Prober::new(registry.clone(), checker.clone()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler =
        Scheduler::new(batcher, Duration::from_millis(50)).spawn(shutdown_rx.clone());
    let workers = WorkerPool::new(prober, receiver, 2, 10).spawn(shutdown_rx);

    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let sites = registry.list_all().await.unwrap();
            if sites.iter().all(|site| site.last_checked != LastChecked::Never) {
                break sites;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(settled[0].status, SiteStatus::Up);
    assert_eq!(settled[1].url, "https://b.org/health");
    assert_eq!(settled[1].status, SiteStatus::Down);
    assert!(checker.targets().iter().any(|t| t == "https://b.org/health"));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), scheduler).await.unwrap().unwrap();
    for worker in workers {
        tokio::time::timeout(Duration::from_secs(5), worker).await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_failed_invocation_does_not_stop_the_scheduler() {
    let registry = Arc::new(FlakyRegistry::failing_scan());
    registry.register("a.com").await.unwrap();

    let (queue, mut receiver) = channel(64);
    let batcher = Arc::new(Batcher::new(registry.clone(), Arc::new(queue), 10));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(batcher, Duration::from_millis(20)).spawn(shutdown_rx);

    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.scans() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert!(receiver.try_next_delivery(10).is_none());

    registry.recover_scan();
    let delivery = tokio::time::timeout(Duration::from_secs(5), receiver.next_delivery(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivery.messages[0].body, "a.com");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), scheduler).await.unwrap().unwrap();
}
