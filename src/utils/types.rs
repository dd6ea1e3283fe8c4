use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};
use uuid::Uuid;

use super::error::AppError;

pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Path ids that are not valid UUIDs can never match a row, so they read as "not found".
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(not_found))
}

#[derive(serde::Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_not_found() {
        let err = parse_id("64b7f0c2e1", "Course not found").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Course not found"));
    }

    #[test]
    fn uuid_id_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "x").unwrap(), id);
    }
}
