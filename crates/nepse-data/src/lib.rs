//! NEPSE 데이터 계층.
//!
//! TTL 캐시 저장소(`cache`), 업스트림 피드 클라이언트(`feeds`),
//! 구독자/알림 저장소 구현(`store`)을 제공합니다.

pub mod cache;
pub mod error;
pub mod feeds;
pub mod store;

pub use cache::{CacheEntry, CacheStore};
pub use error::FetchError;
pub use feeds::{FeedClient, FeedSource};
pub use store::{MemoryAlertStore, MemorySubscriberStore, PgAlertStore, PgSubscriberStore};
