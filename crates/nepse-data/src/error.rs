//! 업스트림 조회 에러 타입.

use std::time::Duration;

use thiserror::Error;

/// 업스트림 피드 조회 실패.
///
/// 캐시 계층은 이 에러를 그대로 호출자에게 전파하며, 기존 캐시 항목은
/// 건드리지 않습니다 (stale-but-available 우선).
#[derive(Debug, Error)]
pub enum FetchError {
    /// 비 2xx 응답
    #[error("업스트림 응답 오류: HTTP {status} ({url})")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// 연결/전송 실패
    #[error("업스트림 요청 실패 ({url}): {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 요청별 데드라인 초과
    #[error("업스트림 응답 시간 초과 ({url}, {timeout:?})")]
    Timeout { url: String, timeout: Duration },

    /// 응답 본문이 JSON으로 파싱되지 않음
    #[error("업스트림 응답 파싱 실패 ({url}): {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 클라이언트 구성 실패
    #[error("HTTP 클라이언트 구성 실패: {0}")]
    Client(String),
}
