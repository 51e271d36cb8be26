//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use chrono::{NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;

use crate::{CollectorError, Result};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (없으면 메모리 저장소)
    pub database_url: Option<String>,
    /// 시장 타임존
    pub timezone: Tz,
    /// 캐시/조회 설정
    pub cache: CacheConfig,
    /// 영업일/장중 시간 창 설정
    pub window: MarketWindowConfig,
    /// 트리거 캘린더 식
    pub schedule: ScheduleConfig,
    /// 가격 알림 평가 설정
    pub alerts: AlertEvalConfig,
}

/// 캐시/조회 설정
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// 일반 피드 TTL (초)
    /// 기본값: 300 (5분)
    pub ttl_secs: u64,
    /// 시장 상태 피드 TTL (초)
    /// 개장 감지는 최신 값이 필요하므로 짧게 유지. 기본값: 60
    pub market_status_ttl_secs: u64,
    /// 업스트림 요청별 데드라인 (초)
    /// 기본값: 10
    pub fetch_timeout_secs: u64,
}

/// 영업일/장중 시간 창 설정
///
/// NEPSE 기준: 영업일 일~목, 장중 11:00~15:00 (Asia/Kathmandu).
#[derive(Debug, Clone)]
pub struct MarketWindowConfig {
    /// 영업일 요일 목록
    pub business_days: Vec<Weekday>,
    /// 장 시작 (자정 기준 분, 포함)
    pub open_minute: u32,
    /// 장 마감 (자정 기준 분, 미포함)
    pub close_minute: u32,
}

/// 트리거 캘린더 식 (초 필드 포함 cron)
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// IPO 데이터: 하루 2회 (10:00, 20:00)
    pub ipo_cron: String,
    /// 시장 데이터: 5분마다 (영업일 장중만)
    pub market_data_cron: String,
    /// 가격 알림: 2분마다 (영업일 장중만)
    pub price_alerts_cron: String,
    /// 시장 상태 감시: 매일 11:00 (영업일만)
    pub market_status_cron: String,
    /// 뉴스: 하루 3회 (08:00, 14:00, 20:00)
    pub news_cron: String,
}

/// 가격 알림 평가 설정
#[derive(Debug, Clone)]
pub struct AlertEvalConfig {
    /// 반복 알림 재발동 최소 간격 (분)
    /// 0이면 조건이 유지되는 동안 평가 주기마다 재발동 (원 동작 유지)
    pub recurring_refire_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timezone = match std::env::var("MARKET_TIMEZONE") {
            Ok(name) => name.parse::<Tz>().map_err(|e| {
                CollectorError::Config(format!("MARKET_TIMEZONE 파싱 실패 ({}): {}", name, e))
            })?,
            Err(_) => chrono_tz::Asia::Kathmandu,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            timezone,
            cache: CacheConfig {
                ttl_secs: env_var_parse("CACHE_TTL_SECS", 300),
                market_status_ttl_secs: env_var_parse("MARKET_STATUS_TTL_SECS", 60),
                fetch_timeout_secs: env_var_parse("FETCH_TIMEOUT_SECS", 10),
            },
            window: MarketWindowConfig {
                business_days: env_var_weekdays(
                    "MARKET_BUSINESS_DAYS",
                    vec![
                        Weekday::Sun,
                        Weekday::Mon,
                        Weekday::Tue,
                        Weekday::Wed,
                        Weekday::Thu,
                    ],
                )?,
                open_minute: env_var_time_minutes("MARKET_OPEN_TIME", 11 * 60)?,
                close_minute: env_var_time_minutes("MARKET_CLOSE_TIME", 15 * 60)?,
            },
            schedule: ScheduleConfig {
                ipo_cron: env_var_string("SCHEDULE_IPO_CRON", "0 0 10,20 * * *"),
                market_data_cron: env_var_string("SCHEDULE_MARKET_DATA_CRON", "0 */5 * * * *"),
                price_alerts_cron: env_var_string("SCHEDULE_PRICE_ALERTS_CRON", "0 */2 * * * *"),
                market_status_cron: env_var_string("SCHEDULE_MARKET_STATUS_CRON", "0 0 11 * * *"),
                news_cron: env_var_string("SCHEDULE_NEWS_CRON", "0 0 8,14,20 * * *"),
            },
            alerts: AlertEvalConfig {
                recurring_refire_minutes: env_var_parse("ALERT_RECURRING_REFIRE_MINUTES", 0),
            },
        })
    }
}

impl CacheConfig {
    /// 일반 피드 TTL을 Duration으로 반환
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// 시장 상태 TTL을 Duration으로 반환
    pub fn market_status_ttl(&self) -> Duration {
        Duration::from_secs(self.market_status_ttl_secs)
    }

    /// 요청별 데드라인을 Duration으로 반환
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl AlertEvalConfig {
    /// 재발동 최소 간격을 Duration으로 반환
    pub fn refire_interval(&self) -> Duration {
        Duration::from_secs(self.recurring_refire_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 문자열 로드 (기본값 지원)
fn env_var_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 환경변수에서 쉼표로 구분된 요일 목록 파싱 (예: "sun,mon,tue,wed,thu")
fn env_var_weekdays(key: &str, default: Vec<Weekday>) -> Result<Vec<Weekday>> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Weekday>()
                    .map_err(|_| CollectorError::Config(format!("{} 요일 파싱 실패: {}", key, s)))
            })
            .collect(),
    }
}

/// 환경변수에서 "HH:MM" 형식 시각을 자정 기준 분으로 파싱
fn env_var_time_minutes(key: &str, default: u32) -> Result<u32> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let time = NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|e| {
                CollectorError::Config(format!("{} 시각 파싱 실패 ({}): {}", key, raw, e))
            })?;
            Ok(time.hour() * 60 + time.minute())
        }
    }
}
