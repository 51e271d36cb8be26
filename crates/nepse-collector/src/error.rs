//! 에러 타입 정의.

use std::fmt;

use nepse_core::StoreError;
use nepse_data::FetchError;
use nepse_notification::PushError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 업스트림 조회 에러
    Fetch(FetchError),
    /// 저장소 에러
    Store(StoreError),
    /// 푸시 전송 에러
    Push(PushError),
    /// 설정 에러
    Config(String),
    /// 트리거 등록/실행 에러
    Scheduling(String),
    /// 업스트림 페이로드에 기대한 필드가 없음
    DataSource(String),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Push(e) => write!(f, "Push error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Scheduling(msg) => write!(f, "Scheduling error: {}", msg),
            Self::DataSource(msg) => write!(f, "Data source error: {}", msg),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<FetchError> for CollectorError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl From<StoreError> for CollectorError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<PushError> for CollectorError {
    fn from(err: PushError) -> Self {
        Self::Push(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
