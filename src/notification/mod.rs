pub mod handlers;
pub mod models;

pub use handlers::{MailError, Mailer};
pub use models::{Notification, PasswordResetNotification};
