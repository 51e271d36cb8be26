//! 알림 디스패처.
//!
//! 대상 토큰 집합을 제공자 한도 청크로 쪼개 전송하고, 메시지별 결과를
//! 분류합니다. 영구 실패(`DeviceNotRegistered` 등) 토큰은 구독자
//! 저장소에서 제거하고, 일시 실패는 로그만 남깁니다. 부분 실패는 에러가
//! 아니며, 제공자에 전혀 닿지 못한 경우에만 에러를 돌려줍니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use nepse_core::SubscriberStore;

use crate::types::{PushError, PushMessage, PushProvider, TicketStatus};

/// 전송 결과 집계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 형식 검증을 통과해 전송을 시도한 토큰 수
    pub attempted: usize,
    /// 제공자가 수락한 메시지 수
    pub delivered: usize,
    /// 영구 실패로 저장소에서 제거된 토큰 수
    pub pruned: usize,
    /// 전송 자체가 실패한 청크 수
    pub failed_chunks: usize,
}

impl DispatchReport {
    /// 집계 요약 로그 출력.
    pub fn log_summary(&self, title: &str) {
        info!(
            title = title,
            attempted = self.attempted,
            delivered = self.delivered,
            pruned = self.pruned,
            failed_chunks = self.failed_chunks,
            "알림 전송 완료"
        );
    }
}

/// 푸시 알림 디스패처.
pub struct Dispatcher {
    provider: Arc<dyn PushProvider>,
    subscribers: Arc<dyn SubscriberStore>,
}

impl Dispatcher {
    /// 제공자와 구독자 저장소를 주입해 생성.
    pub fn new(provider: Arc<dyn PushProvider>, subscribers: Arc<dyn SubscriberStore>) -> Self {
        Self {
            provider,
            subscribers,
        }
    }

    /// 지정된 토큰 집합에 메시지 전송.
    ///
    /// 형식이 틀린 토큰은 전송 전에 조용히 걸러집니다 (등록 단계에서
    /// 걸러졌어야 하는 값이므로 에러가 아님).
    pub async fn dispatch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: Value,
    ) -> Result<DispatchReport, PushError> {
        let valid: Vec<&String> = tokens
            .iter()
            .filter(|t| self.provider.is_valid_token(t.as_str()))
            .collect();

        let dropped = tokens.len() - valid.len();
        if dropped > 0 {
            debug!(dropped = dropped, "형식 불일치 토큰 제외");
        }
        if valid.is_empty() {
            debug!(title = title, "전송 대상 토큰 없음");
            return Ok(DispatchReport::default());
        }

        let mut report = DispatchReport {
            attempted: valid.len(),
            ..DispatchReport::default()
        };

        let chunks: Vec<&[&String]> = valid.chunks(self.provider.chunk_size()).collect();
        let total_chunks = chunks.len();

        for chunk in chunks {
            let messages: Vec<PushMessage> = chunk
                .iter()
                .map(|token| PushMessage::new(token.as_str(), title, body, data.clone()))
                .collect();

            let tickets = match self.provider.send_chunk(&messages).await {
                Ok(tickets) => tickets,
                Err(e) => {
                    // 이 청크의 토큰들은 pruning도 전달 집계도 하지 않음
                    warn!(
                        provider = self.provider.name(),
                        error = %e,
                        tokens = chunk.len(),
                        "청크 전송 실패"
                    );
                    report.failed_chunks += 1;
                    continue;
                }
            };

            for (token, ticket) in chunk.iter().zip(tickets.iter()) {
                match ticket.status {
                    TicketStatus::Ok => report.delivered += 1,
                    TicketStatus::Error => {
                        let reason = ticket.error_reason.as_deref().unwrap_or("unknown");
                        if self.provider.is_permanent_error(reason) {
                            match self.subscribers.remove_token(token.as_str()).await {
                                Ok(()) => {
                                    info!(token = %token, reason = reason, "무효 토큰 제거");
                                    report.pruned += 1;
                                }
                                Err(e) => {
                                    warn!(token = %token, error = %e, "무효 토큰 제거 실패");
                                }
                            }
                        } else {
                            // 일시 실패: 잘못된 구독 해지를 막기 위해 보존
                            warn!(
                                token = %token,
                                reason = reason,
                                message = ticket.message.as_deref().unwrap_or(""),
                                "메시지 전달 실패 (토큰 보존)"
                            );
                        }
                    }
                }
            }
        }

        if report.failed_chunks == total_chunks {
            return Err(PushError::AllChunksFailed {
                failed: report.failed_chunks,
                total: total_chunks,
            });
        }

        Ok(report)
    }

    /// 전체 구독자에게 전송.
    ///
    /// 저장소 조회 실패는 수신자 없음으로 처리합니다 (알림은 best-effort).
    pub async fn broadcast(
        &self,
        title: &str,
        body: &str,
        data: Value,
    ) -> Result<DispatchReport, PushError> {
        let tokens = match self.subscribers.all_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "구독자 토큰 조회 실패");
                Vec::new()
            }
        };
        self.dispatch(&tokens, title, body, data).await
    }

    /// 특정 사용자 소유 토큰에만 전송.
    pub async fn notify_user(
        &self,
        owner: &str,
        title: &str,
        body: &str,
        data: Value,
    ) -> Result<DispatchReport, PushError> {
        let tokens = match self.subscribers.tokens_for_user(owner).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(owner = owner, error = %e, "사용자 토큰 조회 실패");
                Vec::new()
            }
        };
        self.dispatch(&tokens, title, body, data).await
    }

    /// 전체 구독자 대상 테스트 알림.
    pub async fn send_hello_world(&self, now: DateTime<Utc>) -> Result<DispatchReport, PushError> {
        self.broadcast(
            "👋 Hello World!",
            "This is a test notification from your NEPSE app.",
            json!({ "type": "hello_world", "timestamp": now.to_rfc3339() }),
        )
        .await
    }
}
