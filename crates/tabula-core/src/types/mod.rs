//! Strongly-typed scalar wrappers carried by [`Value`](crate::value::Value).

mod date;
mod decimal;
mod timestamp;


pub use date::Date;
pub use decimal::Decimal;
pub use timestamp::Timestamp;
