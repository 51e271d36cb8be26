//! 상태 전환 감지.
//!
//! 도메인별 마지막 관측 스냅샷을 보관하고 새 스냅샷과의 차이를 계산합니다.
//!
//! # 규칙
//!
//! - 첫 관측(이전 스냅샷 없음)은 이벤트를 방출하지 않습니다. 콜드 스타트
//!   시 "모든 데이터가 새것"으로 알림이 쏟아지는 것을 막습니다.
//! - 차이 유무와 무관하게 스냅샷은 항상 교체됩니다. 같은 변화가 두 번
//!   방출될 수 없습니다.
//! - IPO 목록은 식별 키(심볼, 폴백 회사명) 기준 추가 항목만 차이로
//!   봅니다. 제거는 알리지 않습니다.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use nepse_core::{ChangeEvent, ChangeKind, IpoEntry};

/// 시장 개장 상태 도메인.
pub const DOMAIN_MARKET_STATUS: &str = "market-status";
/// 진행 중 IPO 도메인.
pub const DOMAIN_ONGOING_IPOS: &str = "ongoing-ipos";
/// 예정 IPO 도메인.
pub const DOMAIN_UPCOMING_IPOS: &str = "upcoming-ipos";

/// 도메인별 마지막 스냅샷 저장소.
///
/// 프로세스 전역 싱글턴이 아니라 생성자 주입으로 전달됩니다.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<String, Value>>,
}

impl SnapshotStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 도메인의 현재 스냅샷 조회.
    pub async fn get(&self, domain: &str) -> Option<Value> {
        self.snapshots.read().await.get(domain).cloned()
    }

    /// 스냅샷 교체, 이전 값 반환.
    pub async fn replace(&self, domain: &str, value: Value) -> Option<Value> {
        self.snapshots.write().await.insert(domain.to_string(), value)
    }

    /// 관측된 도메인 목록 (상태 출력용).
    pub async fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.snapshots.read().await.keys().cloned().collect();
        domains.sort();
        domains
    }
}

/// 도메인별 변화 감지기.
pub struct ChangeDetector {
    snapshots: Arc<SnapshotStore>,
}

impl ChangeDetector {
    /// 스냅샷 저장소를 주입해 생성.
    pub fn new(snapshots: Arc<SnapshotStore>) -> Self {
        Self { snapshots }
    }

    /// 시장 개장 상태 관측.
    ///
    /// 이전 관측과 다르면 [`ChangeKind::MarketOpened`] 또는
    /// [`ChangeKind::MarketClosed`] 이벤트를 돌려줍니다.
    pub async fn observe_market_status(&self, live: bool) -> Option<ChangeEvent> {
        let prev = self
            .snapshots
            .replace(DOMAIN_MARKET_STATUS, Value::Bool(live))
            .await;

        let prev_live = match prev.as_ref().and_then(|v| v.as_bool()) {
            Some(prev_live) => prev_live,
            None => {
                debug!(live = live, "시장 상태 첫 관측, 이벤트 없음");
                return None;
            }
        };

        if prev_live == live {
            return None;
        }

        let kind = if live {
            ChangeKind::MarketOpened
        } else {
            ChangeKind::MarketClosed
        };
        Some(ChangeEvent::new(
            DOMAIN_MARKET_STATUS,
            kind,
            json!({ "market_live": live }),
        ))
    }

    /// IPO 목록 관측.
    ///
    /// 이전 목록에 없던 식별 키의 항목마다 [`ChangeKind::NewIpo`] 이벤트를
    /// 돌려줍니다. 식별 키가 없는 항목은 중복 방출을 막을 수 없으므로
    /// 알리지 않습니다.
    pub async fn observe_ipo_list(&self, domain: &str, entries: &[IpoEntry]) -> Vec<ChangeEvent> {
        let current = Value::Array(entries.iter().map(|e| e.raw.clone()).collect());
        let prev = self.snapshots.replace(domain, current).await;

        let prev = match prev {
            Some(prev) => prev,
            None => {
                debug!(domain = domain, count = entries.len(), "IPO 목록 첫 관측, 이벤트 없음");
                return Vec::new();
            }
        };

        let prev_ids: HashSet<String> = prev
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| IpoEntry::from_value(item).identity().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        entries
            .iter()
            .filter(|entry| {
                entry
                    .identity()
                    .map(|id| !prev_ids.contains(id))
                    .unwrap_or(false)
            })
            .map(|entry| {
                ChangeEvent::new(
                    domain,
                    ChangeKind::NewIpo,
                    json!({
                        "company": entry.display_name(),
                        "symbol": entry.symbol,
                    }),
                )
            })
            .collect()
    }
}
