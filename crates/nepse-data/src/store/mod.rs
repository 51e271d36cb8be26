//! 구독자/알림 저장소 구현.
//!
//! 인터페이스는 `nepse-core::domain::stores`에 있습니다. Postgres 구현은
//! 데몬 운영용, 메모리 구현은 테스트와 DATABASE_URL 없는 실행용입니다.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryAlertStore, MemorySubscriberStore};
pub use postgres::{PgAlertStore, PgSubscriberStore};
