//! 메모리 기반 저장소 구현.
//!
//! 격리된 인스턴스를 요구하는 테스트, 그리고 DATABASE_URL 없이 도는
//! 단발 CLI 실행에서 사용합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use nepse_core::{AlertStore, PriceAlert, StoreError, SubscriberStore};

#[derive(Debug, Clone)]
struct TokenRow {
    token: String,
    owner: Option<String>,
}

/// 메모리 구독자 토큰 저장소.
#[derive(Debug, Default)]
pub struct MemorySubscriberStore {
    tokens: RwLock<Vec<TokenRow>>,
}

impl MemorySubscriberStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn add_token(&self, token: &str, owner: Option<&str>) -> Result<(), StoreError> {
        let mut guard = self.tokens.write().await;
        if !guard.iter().any(|row| row.token == token) {
            guard.push(TokenRow {
                token: token.to_string(),
                owner: owner.map(str::to_string),
            });
        }
        Ok(())
    }

    async fn remove_token(&self, token: &str) -> Result<(), StoreError> {
        let mut guard = self.tokens.write().await;
        guard.retain(|row| row.token != token);
        Ok(())
    }

    async fn all_tokens(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.tokens.read().await;
        Ok(guard.iter().map(|row| row.token.clone()).collect())
    }

    async fn tokens_for_user(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        let guard = self.tokens.read().await;
        Ok(guard
            .iter()
            .filter(|row| row.owner.as_deref() == Some(owner))
            .map(|row| row.token.clone())
            .collect())
    }
}

/// 메모리 가격 알림 저장소.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    alerts: RwLock<Vec<PriceAlert>>,
}

impl MemoryAlertStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 알림 삽입 (테스트 시나리오 구성용).
    pub async fn insert(&self, alert: PriceAlert) {
        self.alerts.write().await.push(alert);
    }

    /// ID로 알림 조회 (테스트 검증용).
    pub async fn get(&self, id: Uuid) -> Option<PriceAlert> {
        let guard = self.alerts.read().await;
        guard.iter().find(|a| a.id == id).cloned()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn untriggered_alerts(&self) -> Result<Vec<PriceAlert>, StoreError> {
        let guard = self.alerts.read().await;
        Ok(guard.iter().filter(|a| !a.triggered).cloned().collect())
    }

    async fn mark_triggered(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        disarm: bool,
    ) -> Result<(), StoreError> {
        let mut guard = self.alerts.write().await;
        let Some(alert) = guard.iter_mut().find(|a| a.id == id) else {
            return Err(StoreError::Invalid(format!("알 수 없는 알림: {}", id)));
        };
        alert.last_triggered_at = Some(at);
        if disarm {
            alert.triggered = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use nepse_core::{AlertCondition, AlertMode};

    use super::*;

    #[tokio::test]
    async fn subscriber_store_deduplicates_tokens() {
        let store = MemorySubscriberStore::new();
        store.add_token("ExponentPushToken[aaa]", Some("user-1")).await.unwrap();
        store.add_token("ExponentPushToken[aaa]", None).await.unwrap();
        store.add_token("ExponentPushToken[bbb]", None).await.unwrap();

        assert_eq!(store.all_tokens().await.unwrap().len(), 2);
        assert_eq!(
            store.tokens_for_user("user-1").await.unwrap(),
            vec!["ExponentPushToken[aaa]".to_string()]
        );

        store.remove_token("ExponentPushToken[aaa]").await.unwrap();
        assert_eq!(
            store.all_tokens().await.unwrap(),
            vec!["ExponentPushToken[bbb]".to_string()]
        );
    }

    #[tokio::test]
    async fn alert_store_disarm_controls_selection() {
        let store = MemoryAlertStore::new();
        let alert = PriceAlert {
            id: Uuid::new_v4(),
            owner: "user-1".to_string(),
            ticker: "NABIL".to_string(),
            target_price: dec!(1000),
            condition: AlertCondition::Above,
            mode: AlertMode::OneTime,
            triggered: false,
            last_triggered_at: None,
        };
        let id = alert.id;
        store.insert(alert).await;

        assert_eq!(store.untriggered_alerts().await.unwrap().len(), 1);

        let at = Utc::now();
        store.mark_triggered(id, at, true).await.unwrap();
        assert!(store.untriggered_alerts().await.unwrap().is_empty());
        assert_eq!(store.get(id).await.unwrap().last_triggered_at, Some(at));
    }

    #[tokio::test]
    async fn recurring_mark_keeps_alert_armed() {
        let store = MemoryAlertStore::new();
        let alert = PriceAlert {
            id: Uuid::new_v4(),
            owner: "user-1".to_string(),
            ticker: "NICA".to_string(),
            target_price: dec!(800),
            condition: AlertCondition::Below,
            mode: AlertMode::Recurring,
            triggered: false,
            last_triggered_at: None,
        };
        let id = alert.id;
        store.insert(alert).await;

        store.mark_triggered(id, Utc::now(), false).await.unwrap();
        assert_eq!(store.untriggered_alerts().await.unwrap().len(), 1);
    }
}
