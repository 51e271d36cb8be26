//! 시계 추상화.
//!
//! TTL 비교와 시간 창 판정이 모두 주입된 시계를 통하도록 하여
//! 테스트에서 임의의 "현재 시각"을 사용할 수 있게 합니다.
//! 프로덕션에서는 [`SystemClock`], 테스트에서는 [`FixedClock`]을 사용합니다.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

/// 현재 시각 제공자.
pub trait Clock: Send + Sync {
    /// 현재 UTC 시각.
    fn now_utc(&self) -> DateTime<Utc>;

    /// 현재 시각을 지정된 타임존의 현지 시각으로 변환.
    fn now_in(&self, tz: Tz) -> DateTime<Tz> {
        self.now_utc().with_timezone(&tz)
    }
}

/// 실제 시스템 시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 고정 시계.
///
/// `set`/`advance`로 시각을 조작할 수 있어 TTL·스케줄 창 테스트에 사용합니다.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// 지정된 시각으로 고정 시계 생성.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// 현재 시각을 교체.
    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.write().expect("clock lock poisoned");
        *guard = now;
    }

    /// 현재 시각을 지정된 만큼 전진.
    pub fn advance(&self, delta: Duration) {
        let mut guard = self.now.write().expect("clock lock poisoned");
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn fixed_clock_set_and_advance() {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now_utc(), t0);

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now_utc(), t0 + Duration::minutes(5));

        let t1 = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        clock.set(t1);
        assert_eq!(clock.now_utc(), t1);
    }

    #[test]
    fn now_in_converts_to_kathmandu() {
        // UTC 05:15 = 네팔 11:00 (UTC+5:45)
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 5, 15, 0).unwrap();
        let clock = FixedClock::new(t);
        let local = clock.now_in(chrono_tz::Asia::Kathmandu);
        assert_eq!(local.format("%H:%M").to_string(), "11:00");
    }
}
