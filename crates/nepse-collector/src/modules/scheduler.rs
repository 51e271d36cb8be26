//! 캘린더 트리거 레지스트리.
//!
//! 이름 있는 트리거를 cron 식(초 필드 포함)과 설정된 타임존으로 등록하고,
//! 각 작업 본문을 다음 규칙으로 감쌉니다.
//!
//! - 시간 창 게이트가 닫혀 있으면 실행하지 않고 로그만 남김 (에러 아님)
//! - 이전 실행이 끝나지 않은 트리거의 발화는 건너뜀 (재진입 방지)
//! - 작업 본문의 에러는 작업 경계에서 잡아 로그로만 남기고 스케줄러
//!   루프로는 절대 전파하지 않음
//!
//! 트리거 간에는 순서 보장이 없습니다.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use nepse_core::Clock;

use crate::{error::CollectorError, modules::window::ScheduleWindow, Result};

/// 이름 있는 캘린더 트리거 집합.
pub struct TriggerSet {
    scheduler: JobScheduler,
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl TriggerSet {
    /// 새 트리거 집합 생성.
    pub async fn new(tz: Tz, clock: Arc<dyn Clock>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| CollectorError::Scheduling(e.to_string()))?;
        Ok(Self {
            scheduler,
            tz,
            clock,
        })
    }

    /// 트리거 등록.
    ///
    /// `gate`가 있으면 발화마다 게이트를 먼저 확인합니다. `job`은 발화마다
    /// 새 future를 만드는 팩토리입니다.
    pub async fn register<F, Fut>(
        &mut self,
        name: &str,
        cron: &str,
        gate: Option<ScheduleWindow>,
        job: F,
    ) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let gated = gate.is_some();
        let trigger_name: Arc<str> = Arc::from(name);
        let gate = Arc::new(gate);
        let clock = self.clock.clone();
        let job = Arc::new(job);
        let in_flight = Arc::new(AtomicBool::new(false));

        let cron_job = Job::new_async_tz(cron, self.tz, move |_id, _scheduler| {
            let name = trigger_name.clone();
            let gate = gate.clone();
            let clock = clock.clone();
            let job = job.clone();
            let in_flight = in_flight.clone();
            Box::pin(async move {
                if let Some(window) = &*gate {
                    if let Some(reason) = window.denial_reason(clock.now_utc()) {
                        debug!(trigger = %name, reason = %reason, "시간 창 밖, 실행 건너뜀");
                        return;
                    }
                }

                // 느린 실행이 자신의 다음 발화와 겹치지 않도록 건너뜀
                if in_flight.swap(true, Ordering::SeqCst) {
                    warn!(trigger = %name, "이전 실행이 아직 진행 중, 이번 발화 건너뜀");
                    return;
                }

                if let Err(e) = job().await {
                    error!(trigger = %name, error = %e, "작업 실패");
                }
                in_flight.store(false, Ordering::SeqCst);
            })
        })
        .map_err(|e| CollectorError::Scheduling(format!("트리거 {} 등록 실패: {}", name, e)))?;

        self.scheduler
            .add(cron_job)
            .await
            .map_err(|e| CollectorError::Scheduling(format!("트리거 {} 추가 실패: {}", name, e)))?;

        info!(trigger = name, cron = cron, gated = gated, tz = %self.tz, "트리거 등록");
        Ok(())
    }

    /// 트리거 발화 시작.
    pub async fn start(&mut self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| CollectorError::Scheduling(e.to_string()))
    }

    /// 모든 트리거 중지.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| CollectorError::Scheduling(e.to_string()))
    }
}
