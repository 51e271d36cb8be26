//! 푸시 제공자 추상화와 공용 타입.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 단말 하나에 보내는 푸시 메시지.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    /// 수신 단말 푸시 토큰
    pub to: String,
    pub title: String,
    pub body: String,
    /// 클라이언트 앱으로 전달되는 구조화 데이터
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl PushMessage {
    /// 기본 사운드가 설정된 메시지 생성.
    pub fn new(to: impl Into<String>, title: impl Into<String>, body: impl Into<String>, data: Value) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            data,
            sound: Some("default".to_string()),
        }
    }
}

/// 메시지별 전달 결과 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
}

/// 메시지별 전달 티켓.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTicket {
    pub status: TicketStatus,
    /// 제공자 측 영수증 ID (성공 시)
    pub id: Option<String>,
    /// 사람이 읽는 에러 설명
    pub message: Option<String>,
    /// 기계가 읽는 에러 사유 (예: "DeviceNotRegistered")
    pub error_reason: Option<String>,
}

impl PushTicket {
    /// 성공 티켓.
    pub fn ok(id: Option<String>) -> Self {
        Self {
            status: TicketStatus::Ok,
            id,
            message: None,
            error_reason: None,
        }
    }

    /// 실패 티켓.
    pub fn error(reason: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status: TicketStatus::Error,
            id: None,
            message,
            error_reason: Some(reason.into()),
        }
    }
}

/// 푸시 전송 에러.
///
/// 청크 단위 전송 자체가 불가능한 경우에만 발생합니다. 메시지별 실패는
/// [`PushTicket`]으로 표현되며 에러가 아닙니다.
#[derive(Debug, Error)]
pub enum PushError {
    /// 제공자 연결/전송 실패
    #[error("푸시 제공자 요청 실패: {0}")]
    Network(String),

    /// 제공자 비 2xx 응답
    #[error("푸시 제공자 응답 오류: HTTP {0}")]
    Status(u16),

    /// 제공자 응답 파싱 실패
    #[error("푸시 제공자 응답 파싱 실패: {0}")]
    Decode(String),

    /// 모든 청크 전송 실패 (제공자 완전 불가)
    #[error("모든 청크 전송 실패 ({failed}/{total})")]
    AllChunksFailed { failed: usize, total: usize },
}

/// 푸시 제공자 인터페이스.
///
/// 토큰 형식 검증, 청크 크기, 영구 실패 분류, 청크 단위 전송을 제공합니다.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// 제공자 이름 (로그용).
    fn name(&self) -> &str;

    /// 토큰이 제공자 형식에 맞는지 여부.
    ///
    /// 형식이 틀린 토큰은 전송 전에 조용히 걸러집니다.
    fn is_valid_token(&self, token: &str) -> bool;

    /// 한 번의 배치 호출에 실을 수 있는 최대 메시지 수.
    fn chunk_size(&self) -> usize;

    /// 에러 사유가 "수신처가 영구히 사라짐"을 뜻하는지 여부.
    ///
    /// true인 토큰만 구독자 저장소에서 제거됩니다. 일시 장애를 영구로
    /// 분류하면 잘못된 구독 해지가 발생하므로 보수적으로 판정해야 합니다.
    fn is_permanent_error(&self, reason: &str) -> bool;

    /// 청크 하나를 배치 호출로 전송.
    ///
    /// 반환되는 티켓은 입력 메시지와 같은 순서여야 합니다.
    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError>;
}
