//! 시장 상태 감시 작업.
//!
//! 시장 상태 피드를 짧은 TTL로 조회해 개장/마감 전환을 감지하고,
//! 전환 시 전체 구독자에게 알림을 보냅니다. 스냅샷이 항상 교체되므로
//! 같은 전환이 두 번 알림되지 않습니다.

use std::time::{Duration, Instant};

use chrono_tz::Tz;
use serde_json::json;
use tracing::{info, warn};

use nepse_core::{ChangeKind, Clock};
use nepse_data::{feeds, CacheStore, FeedClient, FeedSource};
use nepse_notification::Dispatcher;

use crate::{
    error::CollectorError, modules::change_detector::ChangeDetector, stats::SyncStats, Result,
};

/// 시장 상태 확인 및 전환 알림.
pub async fn check_market_status(
    cache: &CacheStore,
    feeds_client: &FeedClient,
    detector: &ChangeDetector,
    dispatcher: &Dispatcher,
    clock: &dyn Clock,
    tz: Tz,
    status_ttl: Duration,
) -> Result<SyncStats> {
    let start = Instant::now();

    let payload = cache
        .get_or_fetch(FeedSource::MarketStatus.cache_key(), status_ttl, || {
            feeds_client.fetch(FeedSource::MarketStatus)
        })
        .await?;

    let live = feeds::market_live(&payload).ok_or_else(|| {
        CollectorError::DataSource("market-status 응답에 market_live 필드가 없습니다".to_string())
    })?;
    info!(market_live = live, "시장 상태 확인");

    let mut stats = SyncStats {
        sources: 1,
        fetched: 1,
        ..SyncStats::new()
    };

    let Some(event) = detector.observe_market_status(live).await else {
        stats.elapsed = start.elapsed();
        return Ok(stats);
    };
    stats.events = 1;

    let now = clock.now_utc();
    let local = now.with_timezone(&tz);
    let data = json!({
        "type": event.kind.to_string(),
        "timestamp": now.to_rfc3339(),
        "market_live": live,
        "source": "api_detection",
        "day": local.format("%A").to_string(),
    });

    let (title, body) = match event.kind {
        ChangeKind::MarketOpened => (
            "📈 Market is Now Open!",
            "Nepal Stock Exchange is now live for trading!",
        ),
        ChangeKind::MarketClosed => (
            "🔔 Market Closed",
            "Nepal Stock Exchange has closed for trading.",
        ),
        // IPO 이벤트는 이 감지기에서 나오지 않음
        ChangeKind::NewIpo => {
            stats.elapsed = start.elapsed();
            return Ok(stats);
        }
    };

    match dispatcher.broadcast(title, body, data).await {
        Ok(report) => {
            stats.notified = 1;
            report.log_summary(title);
        }
        Err(e) => warn!(error = %e, "시장 상태 알림 전송 실패"),
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use nepse_core::{FixedClock, SubscriberStore};
    use nepse_data::MemorySubscriberStore;
    use nepse_notification::MockPushProvider;

    use crate::modules::change_detector::SnapshotStore;

    use super::*;

    #[tokio::test]
    async fn missing_market_live_field_is_a_data_source_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/market-status")
            .with_status(200)
            .with_body(r#"{"response": "maintenance"}"#)
            .create_async()
            .await;

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 5, 15, 0).unwrap(),
        ));
        let cache = CacheStore::new(clock.clone());
        let feeds_client = FeedClient::with_defaults().unwrap().with_override(
            FeedSource::MarketStatus,
            format!("{}/market-status", server.url()),
        );
        let detector = ChangeDetector::new(Arc::new(SnapshotStore::new()));
        let subscribers = Arc::new(MemorySubscriberStore::new());
        subscribers
            .add_token("ExponentPushToken[device-1]", None)
            .await
            .unwrap();
        let provider = Arc::new(MockPushProvider::new());
        let dispatcher = Dispatcher::new(provider.clone(), subscribers);

        let err = check_market_status(
            &cache,
            &feeds_client,
            &detector,
            &dispatcher,
            clock.as_ref(),
            chrono_tz::Asia::Kathmandu,
            Duration::from_secs(60),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CollectorError::DataSource(_)));
        assert_eq!(provider.sent_chunks().await, 0);
    }
}
