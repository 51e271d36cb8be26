//! 가격 알림 도메인 타입.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 알림 발동 조건.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    /// 현재가가 목표가 이상일 때 발동
    Above,
    /// 현재가가 목표가 이하일 때 발동
    Below,
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCondition::Above => write!(f, "above"),
            AlertCondition::Below => write!(f, "below"),
        }
    }
}

impl std::str::FromStr for AlertCondition {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "above" => Ok(AlertCondition::Above),
            "below" => Ok(AlertCondition::Below),
            _ => Err(format!("Invalid alert condition: {}", s)),
        }
    }
}

/// 알림 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertMode {
    /// 1회성: 발동 후 다시 평가되지 않음
    OneTime,
    /// 반복: 발동 후에도 계속 평가 대상
    Recurring,
}

impl std::fmt::Display for AlertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertMode::OneTime => write!(f, "one-time"),
            AlertMode::Recurring => write!(f, "recurring"),
        }
    }
}

impl std::str::FromStr for AlertMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one-time" | "one_time" => Ok(AlertMode::OneTime),
            "recurring" => Ok(AlertMode::Recurring),
            _ => Err(format!("Invalid alert mode: {}", s)),
        }
    }
}

/// 가격 알림.
///
/// 사용자 소유의 목표가 알림으로, 평가는 [`nepse-collector`]의
/// Price Alert Evaluator만 수행합니다. 생성/삭제는 범위 밖(협력자 몫)입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    /// 소유 사용자 식별자
    pub owner: String,
    pub ticker: String,
    pub target_price: Decimal,
    pub condition: AlertCondition,
    pub mode: AlertMode,
    /// 1회성 알림이 이미 발동했는지 여부
    pub triggered: bool,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

impl PriceAlert {
    /// 현재가 기준 발동 여부.
    ///
    /// 경계 포함: 목표가와 정확히 같아도 발동합니다.
    pub fn should_trigger(&self, current: Decimal) -> bool {
        match self.condition {
            AlertCondition::Above => current >= self.target_price,
            AlertCondition::Below => current <= self.target_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn alert(condition: AlertCondition, target: Decimal) -> PriceAlert {
        PriceAlert {
            id: Uuid::new_v4(),
            owner: "user-1".to_string(),
            ticker: "NABIL".to_string(),
            target_price: target,
            condition,
            mode: AlertMode::OneTime,
            triggered: false,
            last_triggered_at: None,
        }
    }

    #[test]
    fn above_fires_at_and_beyond_target() {
        let a = alert(AlertCondition::Above, dec!(500));
        assert!(!a.should_trigger(dec!(499.9)));
        assert!(a.should_trigger(dec!(500))); // 경계 포함
        assert!(a.should_trigger(dec!(500.1)));
    }

    #[test]
    fn below_fires_at_and_under_target() {
        let a = alert(AlertCondition::Below, dec!(500));
        assert!(a.should_trigger(dec!(499.9)));
        assert!(a.should_trigger(dec!(500))); // 경계 포함
        assert!(!a.should_trigger(dec!(500.1)));
    }

    #[test]
    fn condition_and_mode_round_trip() {
        assert_eq!(
            "above".parse::<AlertCondition>().unwrap(),
            AlertCondition::Above
        );
        assert_eq!(AlertCondition::Below.to_string(), "below");
        assert_eq!("one-time".parse::<AlertMode>().unwrap(), AlertMode::OneTime);
        assert_eq!(AlertMode::Recurring.to_string(), "recurring");
        assert!("sideways".parse::<AlertCondition>().is_err());
    }
}
