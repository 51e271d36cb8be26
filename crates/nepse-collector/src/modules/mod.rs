//! 스케줄 작업 모듈.

pub mod change_detector;
pub mod ipo_sync;
pub mod market_status;
pub mod market_sync;
pub mod price_alerts;
pub mod scheduler;
pub mod window;

pub use change_detector::{
    ChangeDetector, SnapshotStore, DOMAIN_MARKET_STATUS, DOMAIN_ONGOING_IPOS, DOMAIN_UPCOMING_IPOS,
};
pub use ipo_sync::sync_ipo_data;
pub use market_status::check_market_status;
pub use market_sync::{sync_market_data, sync_news};
pub use price_alerts::check_price_alerts;
pub use scheduler::TriggerSet;
pub use window::ScheduleWindow;
