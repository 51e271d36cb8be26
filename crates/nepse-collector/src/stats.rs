//! 동기화/평가 통계 구조체.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 동기화 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// 조회한 소스 수
    pub sources: usize,
    /// 성공적으로 가져온 페이로드 수
    pub fetched: usize,
    /// 방출된 변화 이벤트 수
    pub events: usize,
    /// 전송한 알림(디스패치 호출) 수
    pub notified: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            sources = self.sources,
            fetched = self.fetched,
            events = self.events,
            notified = self.notified,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );
    }
}

/// 가격 알림 평가 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertCheckStats {
    /// 활성(미발동) 알림 수
    pub active: usize,
    /// 시세가 있어 실제 평가한 알림 수
    pub evaluated: usize,
    /// 발동한 알림 수
    pub triggered: usize,
    /// 재발동 간격으로 억제된 반복 알림 수
    pub suppressed: usize,
    /// 전송한 알림 수
    pub notified: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl AlertCheckStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            active = self.active,
            evaluated = self.evaluated,
            triggered = self.triggered,
            suppressed = self.suppressed,
            notified = self.notified,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "가격 알림 평가 완료"
        );
    }
}
