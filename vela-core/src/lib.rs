pub mod error;
pub mod gateway;
pub mod order;
pub mod quota;
pub mod repository;

pub use error::CoreError;
pub use order::{Order, OrderStatus, ResourceRequest};
pub use quota::{start_of_hour, start_of_utc_day, AccountClaim, HourBucket};
