//! 가격 알림 평가 작업.
//!
//! 장중 시간 창이 열려 있을 때만 동작합니다. 네트워크 호출 없이 가장
//! 최신의 시세 캐시 항목을 사용하고, 목표가 도달(경계 포함) 시 해당
//! 알림 소유자의 단말에만 알림을 보냅니다.
//!
//! - 1회성 알림은 발동 후 비활성화되어 다시는 평가되지 않습니다.
//! - 반복 알림은 발동 후에도 활성 상태로 남습니다. 조건이 유지되면
//!   평가 주기마다 재발동하며, 재발동 최소 간격을 설정해 억제할 수
//!   있습니다.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, info, warn};

use nepse_core::{AlertMode, AlertStore, Clock};
use nepse_data::{feeds, CacheStore, FeedSource};
use nepse_notification::Dispatcher;

use crate::{modules::window::ScheduleWindow, stats::AlertCheckStats, Result};

/// 가격 알림 평가.
///
/// 스케줄러 게이트가 이미 시간 창을 확인하지만, CLI에서 직접 호출해도
/// 같은 제약이 걸리도록 본문에서 다시 확인합니다.
pub async fn check_price_alerts(
    cache: &CacheStore,
    alert_store: &dyn AlertStore,
    dispatcher: &Dispatcher,
    clock: &dyn Clock,
    window: &ScheduleWindow,
    refire_interval: Duration,
) -> Result<AlertCheckStats> {
    let start = Instant::now();
    let mut stats = AlertCheckStats::new();

    if let Some(reason) = window.denial_reason(clock.now_utc()) {
        info!(reason = %reason, "가격 알림 평가 건너뜀");
        return Ok(stats);
    }

    // 네트워크 호출 없음: 마지막으로 성공한 시세 스냅샷 사용
    let Some(entry) = cache.get_any(FeedSource::Tickers.cache_key()).await else {
        warn!("시세 캐시가 비어 있어 가격 알림을 평가할 수 없습니다");
        return Ok(stats);
    };
    let quotes = feeds::ticker_quotes(&entry.payload);
    if quotes.is_empty() {
        warn!("시세 페이로드에 사용할 수 있는 항목이 없습니다");
        return Ok(stats);
    }
    let prices: HashMap<&str, Decimal> =
        quotes.iter().map(|q| (q.ticker.as_str(), q.ltp)).collect();

    let alerts = alert_store.untriggered_alerts().await?;
    stats.active = alerts.len();
    let now = clock.now_utc();
    let min_gap = chrono::Duration::from_std(refire_interval).unwrap_or(chrono::Duration::MAX);

    for alert in alerts {
        // 현재 시세에 없는 종목은 건너뜀 (에러 아님)
        let Some(&price) = prices.get(alert.ticker.as_str()) else {
            continue;
        };
        stats.evaluated += 1;

        if !alert.should_trigger(price) {
            continue;
        }

        if alert.mode == AlertMode::Recurring && !refire_interval.is_zero() {
            if let Some(last) = alert.last_triggered_at {
                if now.signed_duration_since(last) < min_gap {
                    stats.suppressed += 1;
                    continue;
                }
            }
        }

        let disarm = alert.mode == AlertMode::OneTime;
        if let Err(e) = alert_store.mark_triggered(alert.id, now, disarm).await {
            // 상태 갱신에 실패하면 중복 알림을 피하기 위해 전송하지 않음
            error!(alert_id = %alert.id, error = %e, "알림 발동 기록 실패");
            continue;
        }
        stats.triggered += 1;

        let title = format!("🎯 Price Alert: {}", alert.ticker);
        let body = format!(
            "{} is now {} your target price of {}. Current price: {}",
            alert.ticker, alert.condition, alert.target_price, price
        );
        let data = json!({
            "type": "price_alert",
            "ticker": alert.ticker,
            "targetPrice": alert.target_price,
            "currentPrice": price,
            "condition": alert.condition,
        });

        match dispatcher.notify_user(&alert.owner, &title, &body, data).await {
            Ok(report) => {
                stats.notified += 1;
                report.log_summary(&title);
            }
            Err(e) => warn!(alert_id = %alert.id, error = %e, "가격 알림 전송 실패"),
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
