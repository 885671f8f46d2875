pub mod error;
pub mod format;

pub use error::{AppError, Result, WaitPhase};
pub use format::format_price;
