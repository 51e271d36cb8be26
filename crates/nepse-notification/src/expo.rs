//! Expo 푸시 서비스 클라이언트.
//!
//! Expo push API(`https://exp.host/--/api/v2/push/send`)에 메시지 배열을
//! POST하고 메시지별 티켓을 돌려받습니다. 배치 한도는 100건이며,
//! `DeviceNotRegistered` 사유가 영구 실패(pruning 대상)입니다.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use async_trait::async_trait;

use crate::types::{PushError, PushMessage, PushProvider, PushTicket, TicketStatus};

/// Expo push API 엔드포인트.
pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Expo 배치 한도 (제공자 제약).
pub const EXPO_CHUNK_SIZE: usize = 100;

/// 영구 전달 실패 사유 (앱 삭제 등).
pub const ERROR_DEVICE_NOT_REGISTERED: &str = "DeviceNotRegistered";

/// Expo 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct ExpoConfig {
    /// push API URL (테스트에서 교체 가능)
    pub push_url: String,
    /// Expo access token (enhanced security 프로젝트용, 선택)
    pub access_token: Option<String>,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl Default for ExpoConfig {
    fn default() -> Self {
        Self {
            push_url: EXPO_PUSH_URL.to_string(),
            access_token: None,
            enabled: true,
        }
    }
}

impl ExpoConfig {
    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// - `EXPO_PUSH_URL` (기본: 공식 엔드포인트)
    /// - `EXPO_ACCESS_TOKEN` (선택)
    /// - `EXPO_PUSH_ENABLED` (기본: true)
    pub fn from_env() -> Self {
        let push_url =
            std::env::var("EXPO_PUSH_URL").unwrap_or_else(|_| EXPO_PUSH_URL.to_string());
        let access_token = std::env::var("EXPO_ACCESS_TOKEN").ok();
        let enabled = std::env::var("EXPO_PUSH_ENABLED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        Self {
            push_url,
            access_token,
            enabled,
        }
    }
}

/// Expo 푸시 전송기.
pub struct ExpoPushClient {
    config: ExpoConfig,
    client: reqwest::Client,
}

/// Expo 응답 전체 (`{"data": [...]}`).
#[derive(Debug, Deserialize)]
struct ExpoPushResponse {
    #[serde(default)]
    data: Vec<ExpoTicket>,
}

/// Expo 티켓 (`{"status": "ok"|"error", ...}`).
#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    id: Option<String>,
    message: Option<String>,
    details: Option<ExpoTicketDetails>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicketDetails {
    error: Option<String>,
}

impl From<ExpoTicket> for PushTicket {
    fn from(ticket: ExpoTicket) -> Self {
        if ticket.status == "ok" {
            PushTicket::ok(ticket.id)
        } else {
            PushTicket {
                status: TicketStatus::Error,
                id: ticket.id,
                message: ticket.message,
                error_reason: ticket.details.and_then(|d| d.error),
            }
        }
    }
}

impl ExpoPushClient {
    /// 새 Expo 전송기를 생성합니다.
    pub fn new(config: ExpoConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Self {
        Self::new(ExpoConfig::from_env())
    }

    /// 전송 활성화 여부.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

#[async_trait]
impl PushProvider for ExpoPushClient {
    fn name(&self) -> &str {
        "expo"
    }

    fn is_valid_token(&self, token: &str) -> bool {
        (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
            && token.ends_with(']')
    }

    fn chunk_size(&self) -> usize {
        EXPO_CHUNK_SIZE
    }

    fn is_permanent_error(&self, reason: &str) -> bool {
        reason == ERROR_DEVICE_NOT_REGISTERED
    }

    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
        if !self.is_enabled() {
            debug!(count = messages.len(), "Expo 전송이 비활성화되어 있습니다");
            return Ok(messages.iter().map(|_| PushTicket::ok(None)).collect());
        }

        debug!(count = messages.len(), "Expo 청크 전송");

        let mut request = self.client.post(&self.config.push_url).json(messages);
        if let Some(ref token) = self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Expo push 요청 거부");
            return Err(PushError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PushError::Decode(e.to_string()))?;
        let parsed: ExpoPushResponse =
            serde_json::from_value(body).map_err(|e| PushError::Decode(e.to_string()))?;

        Ok(parsed.data.into_iter().map(PushTicket::from).collect())
    }
}
