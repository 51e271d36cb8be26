//! 외부 협력자 저장소 인터페이스.
//!
//! 구독자(푸시 토큰) 저장소와 가격 알림 저장소는 이 엔진의 외부 협력자이며,
//! 여기서는 소비하는 경계면만 정의합니다. Postgres 구현과 테스트용 메모리
//! 구현은 `nepse-data`에 있습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::alert::PriceAlert;

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),
    /// 저장된 행이 도메인 타입으로 변환되지 않음
    #[error("저장 데이터 변환 실패: {0}")]
    Invalid(String),
}

impl StoreError {
    /// 하부 드라이버 에러를 감싸는 헬퍼.
    pub fn from_db(err: impl std::fmt::Display) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// 구독자 푸시 토큰 저장소.
///
/// 토큰은 고유하며, 인증 사용자 소유이거나 소유자 없는 legacy 토큰입니다.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// 토큰 등록. 이미 있으면 무시합니다.
    async fn add_token(&self, token: &str, owner: Option<&str>) -> Result<(), StoreError>;

    /// 토큰 제거 (명시적 해지 또는 영구 전달 실패 시 pruning).
    async fn remove_token(&self, token: &str) -> Result<(), StoreError>;

    /// 전체 토큰 목록 (사용자 소유 + legacy, 중복 제거).
    async fn all_tokens(&self) -> Result<Vec<String>, StoreError>;

    /// 특정 사용자의 토큰 목록.
    async fn tokens_for_user(&self, owner: &str) -> Result<Vec<String>, StoreError>;
}

/// 가격 알림 저장소.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// 미발동(`triggered = false`) 알림 전체 조회.
    async fn untriggered_alerts(&self) -> Result<Vec<PriceAlert>, StoreError>;

    /// 발동 기록. `disarm`이 true면 1회성 알림으로서 비활성화합니다.
    async fn mark_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        disarm: bool,
    ) -> Result<(), StoreError>;
}
