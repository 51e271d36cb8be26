//! IPO 데이터 동기화 + 신규 IPO 알림 작업.
//!
//! 진행 중/예정 IPO 목록을 캐시를 경유해 동시에 조회하고, 이전 관측에
//! 없던 항목마다 전체 구독자에게 알림 하나를 보냅니다. 목록에서 사라진
//! 항목은 알리지 않습니다.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{info, warn};

use nepse_core::ChangeEvent;
use nepse_data::{feeds, CacheStore, FeedClient, FeedSource};
use nepse_notification::Dispatcher;

use crate::{
    modules::change_detector::{ChangeDetector, DOMAIN_ONGOING_IPOS, DOMAIN_UPCOMING_IPOS},
    stats::SyncStats,
    Result,
};

/// IPO 데이터 동기화.
pub async fn sync_ipo_data(
    cache: &CacheStore,
    feeds_client: &FeedClient,
    detector: &ChangeDetector,
    dispatcher: &Dispatcher,
    ttl: Duration,
) -> Result<SyncStats> {
    let start = Instant::now();
    info!("IPO 데이터 동기화 시작");

    let (ongoing, upcoming) = futures::try_join!(
        cache.get_or_fetch(FeedSource::OngoingIpos.cache_key(), ttl, || {
            feeds_client.fetch(FeedSource::OngoingIpos)
        }),
        cache.get_or_fetch(FeedSource::UpcomingIpos.cache_key(), ttl, || {
            feeds_client.fetch(FeedSource::UpcomingIpos)
        }),
    )?;

    let mut stats = SyncStats {
        sources: 2,
        fetched: 2,
        ..SyncStats::new()
    };

    let ongoing_events = detector
        .observe_ipo_list(DOMAIN_ONGOING_IPOS, &feeds::ipo_entries(&ongoing))
        .await;
    for event in &ongoing_events {
        stats.events += 1;
        notify_ipo(
            dispatcher,
            event,
            "open_ipo",
            "📈 IPO Open for Application",
            |company| format!("Have you applied? There is an IPO open: {}", company),
            &mut stats,
        )
        .await;
    }

    let upcoming_events = detector
        .observe_ipo_list(DOMAIN_UPCOMING_IPOS, &feeds::ipo_entries(&upcoming))
        .await;
    for event in &upcoming_events {
        stats.events += 1;
        notify_ipo(
            dispatcher,
            event,
            "upcoming_ipo",
            "🔔 Upcoming IPO",
            |company| format!("New IPO on the horizon: {}", company),
            &mut stats,
        )
        .await;
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 이벤트 하나를 전체 구독자 알림 하나로 변환.
///
/// 전송 실패는 best-effort로 로그만 남기고 다음 이벤트를 계속 처리합니다.
async fn notify_ipo(
    dispatcher: &Dispatcher,
    event: &ChangeEvent,
    notification_type: &str,
    title: &str,
    body: impl Fn(&str) -> String,
    stats: &mut SyncStats,
) {
    let company = event.details["company"].as_str().unwrap_or("(unknown)").to_string();
    let mut data = event.details.clone();
    data["type"] = json!(notification_type);

    match dispatcher.broadcast(title, &body(&company), data).await {
        Ok(report) => {
            stats.notified += 1;
            report.log_summary(title);
        }
        Err(e) => warn!(company = %company, error = %e, "IPO 알림 전송 실패"),
    }
}
