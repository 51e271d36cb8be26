//! 시장 데이터 동기화 작업.
//!
//! 시세·뉴스·지수·섹터·시장 상태 다섯 피드를 캐시를 경유해 동시에
//! 조회합니다. 그룹 내 한 조회가 실패하면 이 작업 본문 전체가 실패하지만,
//! 다른 트리거의 작업에는 영향을 주지 않습니다 (작업 경계에서 잡힘).

use std::time::{Duration, Instant};

use tracing::info;

use nepse_data::{CacheStore, FeedClient, FeedSource};

use crate::{stats::SyncStats, Result};

/// 시장 데이터 그룹 동기화.
pub async fn sync_market_data(
    cache: &CacheStore,
    feeds: &FeedClient,
    ttl: Duration,
) -> Result<SyncStats> {
    let start = Instant::now();
    info!("시장 데이터 동기화 시작");

    let sources = [
        FeedSource::Tickers,
        FeedSource::News,
        FeedSource::IndicesDaily,
        FeedSource::SectorPerformance,
        FeedSource::MarketStatus,
    ];

    futures::try_join!(
        cache.get_or_fetch(sources[0].cache_key(), ttl, || feeds.fetch(sources[0])),
        cache.get_or_fetch(sources[1].cache_key(), ttl, || feeds.fetch(sources[1])),
        cache.get_or_fetch(sources[2].cache_key(), ttl, || feeds.fetch(sources[2])),
        cache.get_or_fetch(sources[3].cache_key(), ttl, || feeds.fetch(sources[3])),
        cache.get_or_fetch(sources[4].cache_key(), ttl, || feeds.fetch(sources[4])),
    )?;

    Ok(SyncStats {
        sources: sources.len(),
        fetched: sources.len(),
        elapsed: start.elapsed(),
        ..SyncStats::new()
    })
}

/// 뉴스 캐시 갱신.
pub async fn sync_news(cache: &CacheStore, feeds: &FeedClient, ttl: Duration) -> Result<SyncStats> {
    let start = Instant::now();
    info!("뉴스 동기화 시작");

    cache
        .get_or_fetch(FeedSource::News.cache_key(), ttl, || {
            feeds.fetch(FeedSource::News)
        })
        .await?;

    Ok(SyncStats {
        sources: 1,
        fetched: 1,
        elapsed: start.elapsed(),
        ..SyncStats::new()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use nepse_core::FixedClock;

    use super::*;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap(),
        ))
    }

    async fn feed_client_for(server: &mockito::ServerGuard) -> FeedClient {
        FeedClient::with_defaults()
            .unwrap()
            .with_override(FeedSource::Tickers, format!("{}/tickers", server.url()))
            .with_override(FeedSource::News, format!("{}/news", server.url()))
            .with_override(FeedSource::IndicesDaily, format!("{}/indices", server.url()))
            .with_override(
                FeedSource::SectorPerformance,
                format!("{}/sectors", server.url()),
            )
            .with_override(
                FeedSource::MarketStatus,
                format!("{}/market-status", server.url()),
            )
    }

    #[tokio::test]
    async fn fetches_all_sources_into_cache() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for path in ["/tickers", "/news", "/indices", "/sectors", "/market-status"] {
            mocks.push(
                server
                    .mock("GET", path)
                    .with_status(200)
                    .with_body(r#"{"ok": true}"#)
                    .create_async()
                    .await,
            );
        }

        let cache = CacheStore::new(clock());
        let feeds = feed_client_for(&server).await;
        let stats = sync_market_data(&cache, &feeds, Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(stats.fetched, 5);
        assert_eq!(cache.len().await, 5);
        assert!(cache
            .get_fresh("market-status", Duration::from_secs(300))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn one_failing_source_fails_the_group() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for path in ["/tickers", "/news", "/indices", "/sectors"] {
            mocks.push(
                server
                    .mock("GET", path)
                    .with_status(200)
                    .with_body(r#"{"ok": true}"#)
                    .create_async()
                    .await,
            );
        }
        mocks.push(
            server
                .mock("GET", "/market-status")
                .with_status(500)
                .create_async()
                .await,
        );

        let cache = CacheStore::new(clock());
        let feeds = feed_client_for(&server).await;
        let result = sync_market_data(&cache, &feeds, Duration::from_secs(300)).await;

        assert!(result.is_err());
        // 실패한 소스의 캐시 항목은 만들어지지 않음
        assert!(cache.get_any("market-status").await.is_none());
    }
}
