use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::users;

/// Full row, credentials included. Never serialized.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
    pub user_type: String,
    pub qrcode_image: Option<String>,
    pub otp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What clients get to see of a user.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub qrcode_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for SafeUser {
    fn from(user: User) -> Self {
        SafeUser {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            user_type: user.user_type,
            qrcode_image: user.qrcode_image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
    pub user_type: String,
    pub qrcode_image: Option<String>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: SafeUser,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub qrcode_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_user_leaves_credentials_out() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha".to_owned(),
            email: "asha@example.com".to_owned(),
            phone: "9000000000".to_owned(),
            address: "Pune".to_owned(),
            password: "$2b$12$hash".to_owned(),
            user_type: "seller".to_owned(),
            qrcode_image: Some("1700000000000-12345.png".to_owned()),
            otp: Some("123456".to_owned()),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(SafeUser::from(user)).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        assert!(!keys.contains(&"password"));
        assert!(!keys.contains(&"otp"));
        assert_eq!(json["type"], "seller");
        assert_eq!(json["qrcodeImage"], "1700000000000-12345.png");
    }
}
