use std::sync::Arc;
use std::time::Duration;

use webpulse::models::{Liveness, SiteStatus};
use webpulse::monitoring::{HttpChecker, MessageOutcome, Prober, SkipReason};
use webpulse::queue::Delivery;
use webpulse::registry::{MemoryRegistry, Registry};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{FlakyRegistry, ScriptedChecker, memory_registry_with};

fn http_prober(timeout: Duration) -> Prober {
    let checker = HttpChecker::new(timeout).unwrap();
    Prober::new(Arc::new(MemoryRegistry::new()), Arc::new(checker))
}

async fn server_returning(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(template).mount(&server).await;
    server
}

#[tokio::test]
async fn test_http_200_is_up() {
    let server = server_returning(ResponseTemplate::new(200)).await;

    let outcome = http_prober(Duration::from_secs(5)).probe(&server.uri()).await;

    assert_eq!(outcome.status, Liveness::Up);
    assert_eq!(outcome.status_code, Some(200));
    assert!(outcome.latency_ms.is_some());
}

#[tokio::test]
async fn test_http_500_is_down() {
    let server = server_returning(ResponseTemplate::new(500)).await;

    let outcome = http_prober(Duration::from_secs(5)).probe(&server.uri()).await;

    assert_eq!(outcome.status, Liveness::Down);
    assert_eq!(outcome.status_code, Some(500));
}

#[tokio::test]
async fn test_non_200_success_is_down() {
    let server = server_returning(ResponseTemplate::new(204)).await;

    let outcome = http_prober(Duration::from_secs(5)).probe(&server.uri()).await;

    assert_eq!(outcome.status, Liveness::Down);
}

#[tokio::test]
async fn test_timeout_is_down() {
    let server =
        server_returning(ResponseTemplate::new(200).set_delay(Duration::from_secs(3))).await;

    let outcome = http_prober(Duration::from_millis(300)).probe(&server.uri()).await;

    assert_eq!(outcome.status, Liveness::Down);
    assert!(outcome.status_code.is_none());
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_refused_connection_is_down() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = http_prober(Duration::from_secs(2)).probe(&format!("http://{addr}")).await;

    assert_eq!(outcome.status, Liveness::Down);
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_status_is_recorded_under_the_registered_key() {
    let registry = Arc::new(memory_registry_with(&["a.com"]).await);
    let checker = Arc::new(ScriptedChecker::new());
    checker.respond("http://a.com", 200);
    let prober = Prober::new(registry.clone(), checker.clone());

    let outcome = prober.process("a.com").await;

    assert!(matches!(outcome, MessageOutcome::Recorded { status: Liveness::Up, .. }));
    assert_eq!(checker.targets(), ["http://a.com"]);
    assert_eq!(registry.get("a.com").await.unwrap().status, SiteStatus::Up);
    assert!(registry.get("http://a.com").await.is_none());
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_malformed_payload_is_skipped_without_failing_siblings() {
    let registry = Arc::new(memory_registry_with(&["a.com", "b.com", "c.com"]).await);
    let checker = Arc::new(ScriptedChecker::new());
    checker.respond("http://a.com", 200);
    checker.respond("http://c.com", 200);
    let prober = Prober::new(registry.clone(), checker.clone());

    let delivery = Delivery::from_bodies(["a.com", "not a url", "b.com", "c.com"]);
    let report = prober.handle_delivery(delivery).await;

    assert_eq!(report.recorded(), 3);
    assert_eq!(report.skipped(), 1);
    assert!(matches!(
        &report.outcomes[1],
        MessageOutcome::Skipped { reason: SkipReason::InvalidUrl(_), url } if url == "not a url"
    ));
    assert_eq!(registry.get("b.com").await.unwrap().status, SiteStatus::Down);
    assert!(!checker.targets().iter().any(|t| t.contains("not a url")));
}

#[tokio::test]
async fn test_store_failure_skips_only_that_message() {
    let registry = Arc::new(FlakyRegistry::failing_writes(["b.com"]));
    let checker = Arc::new(ScriptedChecker::new());
    checker.respond("http://a.com", 200);
    checker.respond("http://b.com", 200);
    let prober = Prober::new(registry.clone(), checker);

    let report = prober.handle_delivery(Delivery::from_bodies(["a.com", "b.com"])).await;

    assert_eq!(report.recorded(), 1);
    assert!(matches!(
        &report.outcomes[1],
        MessageOutcome::Skipped { reason: SkipReason::StoreFailed(_), .. }
    ));
    let sites = registry.list_all().await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].url, "a.com");
}

#[tokio::test]
async fn test_empty_delivery_is_not_an_error() {
    let prober = Prober::new(Arc::new(MemoryRegistry::new()), Arc::new(ScriptedChecker::new()));

    let report = prober.handle_delivery(Delivery::default()).await;

    assert!(report.outcomes.is_empty());
}
