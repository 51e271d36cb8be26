//! 도메인 타입 정의.

pub mod alert;
pub mod market;
pub mod stores;

pub use alert::{AlertCondition, AlertMode, PriceAlert};
pub use market::{ChangeEvent, ChangeKind, IpoEntry, TickerQuote};
pub use stores::{AlertStore, StoreError, SubscriberStore};
