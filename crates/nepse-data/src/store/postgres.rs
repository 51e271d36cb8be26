//! Postgres 저장소 구현.
//!
//! 테이블 정의는 `sql/schema.sql` 참고. 토큰은 `push_tokens` 단일 테이블에
//! 담기며 `owner`가 NULL인 행이 legacy 익명 토큰입니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use nepse_core::{AlertStore, PriceAlert, StoreError, SubscriberStore};

/// Postgres 구독자 토큰 저장소.
pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    /// 풀 기반 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    async fn add_token(&self, token: &str, owner: Option<&str>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO push_tokens (token, owner)
            VALUES ($1, $2)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(token)
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(())
    }

    async fn remove_token(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query(r#"DELETE FROM push_tokens WHERE token = $1"#)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        if result.rows_affected() > 0 {
            debug!(token = token, "토큰 제거 완료");
        }
        Ok(())
    }

    async fn all_tokens(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT token FROM push_tokens ORDER BY created_at"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_db)
    }

    async fn tokens_for_user(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT token FROM push_tokens WHERE owner = $1 ORDER BY created_at"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_db)
    }
}

/// 가격 알림 행.
///
/// condition/mode는 문자열 컬럼이며 도메인 enum으로 변환 시 검증합니다.
#[derive(Debug, FromRow)]
struct PriceAlertRow {
    id: Uuid,
    owner: String,
    ticker: String,
    target_price: Decimal,
    condition: String,
    mode: String,
    triggered: bool,
    last_triggered_at: Option<DateTime<Utc>>,
}

impl TryFrom<PriceAlertRow> for PriceAlert {
    type Error = StoreError;

    fn try_from(row: PriceAlertRow) -> Result<Self, Self::Error> {
        Ok(PriceAlert {
            id: row.id,
            owner: row.owner,
            ticker: row.ticker,
            target_price: row.target_price,
            condition: row.condition.parse().map_err(StoreError::Invalid)?,
            mode: row.mode.parse().map_err(StoreError::Invalid)?,
            triggered: row.triggered,
            last_triggered_at: row.last_triggered_at,
        })
    }
}

/// Postgres 가격 알림 저장소.
pub struct PgAlertStore {
    pool: PgPool,
}

impl PgAlertStore {
    /// 풀 기반 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn untriggered_alerts(&self) -> Result<Vec<PriceAlert>, StoreError> {
        let rows = sqlx::query_as::<_, PriceAlertRow>(
            r#"
            SELECT id, owner, ticker, target_price, condition, mode,
                   triggered, last_triggered_at
            FROM price_alerts
            WHERE triggered = FALSE
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        rows.into_iter().map(PriceAlert::try_from).collect()
    }

    async fn mark_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        disarm: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE price_alerts
            SET last_triggered_at = $2,
                triggered = (triggered OR $3)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(disarm)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        debug!(alert_id = %id, disarm = disarm, "알림 발동 기록");
        Ok(())
    }
}
