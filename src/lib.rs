pub mod app;
pub mod config;
pub mod contact;
pub mod course;
pub mod notification;
pub mod order;
pub mod payment;
pub mod pool;
pub mod product;
pub mod schema;
pub mod storage;
pub mod upload;
pub mod user;
pub mod user_course;
pub mod utils;

pub use app::{AppState, build_router};
pub use config::Config;
