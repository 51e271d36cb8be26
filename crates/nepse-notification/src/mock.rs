//! 테스트용 목 푸시 제공자.
//!
//! 전송된 청크를 기록하고, 토큰별 실패와 제공자 전체 장애를 시나리오로
//! 지정할 수 있습니다.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::{PushError, PushMessage, PushProvider, PushTicket};

/// 기록/스크립트 가능한 목 제공자.
pub struct MockPushProvider {
    /// 전송된 청크 기록 (청크 단위 그대로)
    sent: Mutex<Vec<Vec<PushMessage>>>,
    /// 토큰 → 에러 사유
    failing_tokens: Mutex<HashMap<String, String>>,
    /// true면 모든 send_chunk가 네트워크 에러
    unreachable: AtomicBool,
    chunk_size: usize,
}

impl MockPushProvider {
    /// 기본 청크 크기(100)의 목 제공자 생성.
    pub fn new() -> Self {
        Self::with_chunk_size(100)
    }

    /// 지정된 청크 크기의 목 제공자 생성.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_tokens: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            chunk_size,
        }
    }

    /// 특정 토큰이 에러 티켓을 받도록 지정.
    pub async fn fail_token(&self, token: &str, reason: &str) {
        self.failing_tokens
            .lock()
            .await
            .insert(token.to_string(), reason.to_string());
    }

    /// 제공자 전체 장애 on/off.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// 전송된 청크 수.
    pub async fn sent_chunks(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// 전송된 메시지 전체 (청크 평탄화).
    pub async fn sent_messages(&self) -> Vec<PushMessage> {
        self.sent.lock().await.iter().flatten().cloned().collect()
    }
}

impl Default for MockPushProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_valid_token(&self, token: &str) -> bool {
        token.starts_with("ExponentPushToken[") && token.ends_with(']')
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_permanent_error(&self, reason: &str) -> bool {
        reason == "DeviceNotRegistered"
    }

    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PushError::Network("mock provider unreachable".to_string()));
        }

        self.sent.lock().await.push(messages.to_vec());

        let failing = self.failing_tokens.lock().await;
        Ok(messages
            .iter()
            .map(|message| match failing.get(&message.to) {
                Some(reason) => PushTicket::error(reason.clone(), None),
                None => PushTicket::ok(Some(format!("mock-{}", message.to))),
            })
            .collect())
    }
}
