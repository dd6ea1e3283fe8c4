pub mod error;
pub mod types;

pub use error::{AppError, handler_404, handler_405, internal_error};
pub use types::{MessageResponse, Pool, parse_id};
