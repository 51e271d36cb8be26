//! 시간 창 게이트.
//!
//! 스케줄 작업이 "지금 실행해도 되는가"를 판정하는 순수 술어입니다.
//! 요일 집합과 자정 기준 [시작, 끝) 분 범위를 설정된 타임존의 현지
//! 시각에 대해 평가합니다. 시작 분은 포함, 끝 분은 미포함입니다 —
//! 이 경계 선택은 정각 전환 시점 동작을 결정하므로 바꾸면 안 됩니다.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::MarketWindowConfig;

/// 하루의 분 수.
const MINUTES_PER_DAY: u32 = 24 * 60;

/// 요일 + 시간대 실행 창.
#[derive(Debug, Clone)]
pub struct ScheduleWindow {
    weekdays: HashSet<Weekday>,
    /// 창 시작 (자정 기준 분, 포함)
    start_minute: u32,
    /// 창 끝 (자정 기준 분, 미포함)
    end_minute: u32,
    tz: Tz,
}

impl ScheduleWindow {
    /// 새 시간 창 생성.
    pub fn new(
        weekdays: impl IntoIterator<Item = Weekday>,
        start_minute: u32,
        end_minute: u32,
        tz: Tz,
    ) -> Self {
        Self {
            weekdays: weekdays.into_iter().collect(),
            start_minute,
            end_minute,
            tz,
        }
    }

    /// 영업일 전일 창 (시간 제한 없음).
    pub fn business_days(config: &MarketWindowConfig, tz: Tz) -> Self {
        Self::new(config.business_days.iter().copied(), 0, MINUTES_PER_DAY, tz)
    }

    /// 영업일 장중 창.
    pub fn market_hours(config: &MarketWindowConfig, tz: Tz) -> Self {
        Self::new(
            config.business_days.iter().copied(),
            config.open_minute,
            config.close_minute,
            tz,
        )
    }

    /// 현지 시각 기준 허용 여부 (순수 함수).
    pub fn allows_local<T: TimeZone>(&self, now_local: &DateTime<T>) -> bool {
        if !self.weekdays.contains(&now_local.weekday()) {
            return false;
        }
        let minutes = now_local.hour() * 60 + now_local.minute();
        self.start_minute <= minutes && minutes < self.end_minute
    }

    /// UTC 시각을 창의 타임존으로 변환해 판정.
    pub fn allows(&self, now_utc: DateTime<Utc>) -> bool {
        self.allows_local(&now_utc.with_timezone(&self.tz))
    }

    /// 거부 사유 (허용이면 None). 건너뜀 로그에 사용합니다.
    pub fn denial_reason(&self, now_utc: DateTime<Utc>) -> Option<String> {
        let local = now_utc.with_timezone(&self.tz);
        if !self.weekdays.contains(&local.weekday()) {
            return Some(format!("{} is not a business day", local.format("%A")));
        }
        let minutes = local.hour() * 60 + local.minute();
        if minutes < self.start_minute || minutes >= self.end_minute {
            return Some(format!(
                "{} is outside the {:02}:{:02}-{:02}:{:02} window",
                local.format("%H:%M"),
                self.start_minute / 60,
                self.start_minute % 60,
                self.end_minute / 60,
                self.end_minute % 60,
            ));
        }
        None
    }

    /// 창의 타임존.
    pub fn timezone(&self) -> Tz {
        self.tz
    }
}
