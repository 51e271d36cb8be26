//! 시장 데이터 도메인 타입.
//!
//! 업스트림 피드의 페이로드는 소스별 스키마를 그대로 싣는 opaque JSON이며,
//! 여기서는 변화 감지와 알림 본문 구성에 필요한 최소 필드만 구조화합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 변화 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// 시장 개장 전환
    MarketOpened,
    /// 시장 마감 전환
    MarketClosed,
    /// 신규 IPO 등장
    NewIpo,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::MarketOpened => write!(f, "market_opened"),
            ChangeKind::MarketClosed => write!(f, "market_closed"),
            ChangeKind::NewIpo => write!(f, "new_ipo"),
        }
    }
}

/// 변화 감지기가 방출하는 이벤트.
///
/// 스케줄 작업이 이벤트 하나를 알림 하나로 변환합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// 추적 도메인 식별자 (예: "market-status", "ongoing-ipos")
    pub domain: String,
    pub kind: ChangeKind,
    /// 알림 data 페이로드로 전달되는 부가 정보
    pub details: Value,
}

impl ChangeEvent {
    /// 새 이벤트 생성.
    pub fn new(domain: impl Into<String>, kind: ChangeKind, details: Value) -> Self {
        Self {
            domain: domain.into(),
            kind,
            details,
        }
    }
}

/// IPO 목록 항목.
///
/// 식별 키는 심볼이며, 심볼이 없는 항목은 회사명으로 대체합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoEntry {
    pub symbol: Option<String>,
    pub name: Option<String>,
    /// 원본 항목 전체 (알림 details에 실을 때 사용)
    pub raw: Value,
}

impl IpoEntry {
    /// 원본 JSON 항목에서 생성.
    ///
    /// 소스에 따라 `symbol`/`stockSymbol`, `name`/`companyName` 키가 섞여
    /// 있어 모두 수용합니다.
    pub fn from_value(item: &Value) -> Self {
        let string_field = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| item.get(key).and_then(Value::as_str))
                .map(str::to_string)
        };
        Self {
            symbol: string_field(&["symbol", "stockSymbol"]),
            name: string_field(&["name", "companyName"]),
            raw: item.clone(),
        }
    }

    /// 변화 감지에 사용하는 식별 키.
    pub fn identity(&self) -> Option<&str> {
        self.symbol.as_deref().or(self.name.as_deref())
    }

    /// 알림 본문에 쓸 표시 이름.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.symbol.as_deref())
            .unwrap_or("(unknown)")
    }
}

/// 실시간 시세 항목 (ticker + 최종 체결가).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub ticker: String,
    /// 최종 체결가 (upstream 필드명: ltp)
    pub ltp: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn ipo_entry_identity_prefers_symbol() {
        let entry = IpoEntry {
            symbol: Some("SBL".to_string()),
            name: Some("Sunrise Bank Limited".to_string()),
            raw: json!({}),
        };
        assert_eq!(entry.identity(), Some("SBL"));

        let nameless = IpoEntry {
            symbol: None,
            name: Some("Sunrise Bank Limited".to_string()),
            raw: json!({}),
        };
        assert_eq!(nameless.identity(), Some("Sunrise Bank Limited"));
        assert_eq!(nameless.display_name(), "Sunrise Bank Limited");
    }

    #[test]
    fn change_kind_display() {
        assert_eq!(ChangeKind::MarketOpened.to_string(), "market_opened");
        assert_eq!(ChangeKind::NewIpo.to_string(), "new_ipo");
    }

    #[test]
    fn ticker_quote_equality() {
        let a = TickerQuote {
            ticker: "NABIL".to_string(),
            ltp: dec!(1250.5),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
