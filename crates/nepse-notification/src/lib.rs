//! 푸시 알림 크레이트.
//!
//! 푸시 제공자 추상화(`types`), Expo 구현(`expo`), 테스트용 목(`mock`),
//! 그리고 청크 전송과 무효 토큰 pruning을 담당하는 디스패처(`dispatcher`)를
//! 제공합니다.

pub mod dispatcher;
pub mod expo;
pub mod mock;
pub mod types;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use expo::{ExpoConfig, ExpoPushClient};
pub use mock::MockPushProvider;
pub use types::{PushError, PushMessage, PushProvider, PushTicket, TicketStatus};
