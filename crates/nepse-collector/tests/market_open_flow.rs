//! 시장 개장 전환 시나리오 통합 테스트.
//!
//! 마감 상태가 관측된 뒤 개장 응답이 오면, 이벤트 하나와 전체 구독자
//! 대상 디스패치 한 번만 발생해야 합니다. 같은 상태의 재관측은 무음입니다.

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use serde_json::json;

use nepse_collector::modules::{check_market_status, ChangeDetector, SnapshotStore};
use nepse_core::{FixedClock, SubscriberStore};
use nepse_data::{CacheStore, FeedClient, FeedSource, MemorySubscriberStore};
use nepse_notification::{Dispatcher, MockPushProvider};

const STATUS_TTL: Duration = Duration::from_secs(60);

struct Harness {
    server: mockito::ServerGuard,
    clock: Arc<FixedClock>,
    cache: CacheStore,
    feeds: FeedClient,
    detector: ChangeDetector,
    dispatcher: Dispatcher,
    provider: Arc<MockPushProvider>,
}

async fn harness() -> Harness {
    let server = mockito::Server::new_async().await;

    // 네팔 2025-06-01(일) 11:00 — 영업일 장 시작 시점
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 5, 15, 0).unwrap(),
    ));
    let cache = CacheStore::new(clock.clone());
    let feeds = FeedClient::with_defaults().unwrap().with_override(
        FeedSource::MarketStatus,
        format!("{}/market-status", server.url()),
    );
    let detector = ChangeDetector::new(Arc::new(SnapshotStore::new()));

    let subscribers = Arc::new(MemorySubscriberStore::new());
    subscribers
        .add_token("ExponentPushToken[device-a]", None)
        .await
        .unwrap();
    subscribers
        .add_token("ExponentPushToken[device-b]", Some("user-1"))
        .await
        .unwrap();

    let provider = Arc::new(MockPushProvider::new());
    let dispatcher = Dispatcher::new(provider.clone(), subscribers);

    Harness {
        server,
        clock,
        cache,
        feeds,
        detector,
        dispatcher,
        provider,
    }
}

fn status_body(live: bool) -> String {
    json!({ "response": [ { "market_live": live } ] }).to_string()
}

#[tokio::test]
async fn market_open_transition_emits_one_event_and_one_dispatch() {
    let mut h = harness().await;

    // 직전 관측: 마감 상태 (캐시에도 마감 스냅샷이 남아 있음)
    h.cache
        .upsert("market-status", json!({ "response": [ { "market_live": false } ] }))
        .await;
    assert!(h.detector.observe_market_status(false).await.is_none());

    // TTL이 지나 다음 조회는 업스트림으로 감 — 개장 응답
    h.clock.advance(chrono::Duration::seconds(90));
    let open_mock = h
        .server
        .mock("GET", "/market-status")
        .with_status(200)
        .with_body(status_body(true))
        .expect(1)
        .create_async()
        .await;

    let stats = check_market_status(
        &h.cache,
        &h.feeds,
        &h.detector,
        &h.dispatcher,
        h.clock.as_ref(),
        chrono_tz::Asia::Kathmandu,
        STATUS_TTL,
    )
    .await
    .unwrap();

    open_mock.assert_async().await;
    assert_eq!(stats.events, 1);
    assert_eq!(stats.notified, 1);

    // 현재 등록된 모든 토큰에 한 번의 디스패치로 전달
    assert_eq!(h.provider.sent_chunks().await, 1);
    let sent = h.provider.sent_messages().await;
    assert_eq!(sent.len(), 2);
    for message in &sent {
        assert_eq!(message.title, "📈 Market is Now Open!");
        assert_eq!(message.data["type"], json!("market_opened"));
        assert_eq!(message.data["market_live"], json!(true));
        assert_eq!(message.data["day"], json!("Sunday"));
    }

    // 캐시 스냅샷도 개장 값으로 교체됨
    let entry = h.cache.get_any("market-status").await.unwrap();
    assert_eq!(entry.payload["response"][0]["market_live"], json!(true));
}

#[tokio::test]
async fn unchanged_status_does_not_redispatch() {
    let mut h = harness().await;
    assert!(h.detector.observe_market_status(false).await.is_none());

    let _mock = h
        .server
        .mock("GET", "/market-status")
        .with_status(200)
        .with_body(status_body(true))
        .expect(2)
        .create_async()
        .await;

    // 첫 번째 실행: 마감 → 개장 전환, 알림 1회
    let stats = check_market_status(
        &h.cache,
        &h.feeds,
        &h.detector,
        &h.dispatcher,
        h.clock.as_ref(),
        chrono_tz::Asia::Kathmandu,
        STATUS_TTL,
    )
    .await
    .unwrap();
    assert_eq!(stats.events, 1);

    // 두 번째 실행 (TTL 경과): 여전히 개장 — 무음
    h.clock.advance(chrono::Duration::seconds(120));
    let stats = check_market_status(
        &h.cache,
        &h.feeds,
        &h.detector,
        &h.dispatcher,
        h.clock.as_ref(),
        chrono_tz::Asia::Kathmandu,
        STATUS_TTL,
    )
    .await
    .unwrap();
    assert_eq!(stats.events, 0);
    assert_eq!(stats.notified, 0);
    assert_eq!(h.provider.sent_chunks().await, 1);
}

#[tokio::test]
async fn fetch_failure_leaves_snapshot_and_cache_untouched() {
    let mut h = harness().await;
    h.cache
        .upsert("market-status", json!({ "response": [ { "market_live": false } ] }))
        .await;
    assert!(h.detector.observe_market_status(false).await.is_none());

    h.clock.advance(chrono::Duration::seconds(90));
    let _mock = h
        .server
        .mock("GET", "/market-status")
        .with_status(502)
        .create_async()
        .await;

    let result = check_market_status(
        &h.cache,
        &h.feeds,
        &h.detector,
        &h.dispatcher,
        h.clock.as_ref(),
        chrono_tz::Asia::Kathmandu,
        STATUS_TTL,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(h.provider.sent_chunks().await, 0);

    // stale 항목은 그대로 남아 호출자가 opt-in으로 쓸 수 있음
    let entry = h.cache.get_any("market-status").await.unwrap();
    assert_eq!(entry.payload["response"][0]["market_live"], json!(false));
}
