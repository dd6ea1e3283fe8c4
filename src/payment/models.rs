use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::payments;

pub const DEFAULT_STATUS: &str = "Pending";

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_email: String,
    /// Id of the purchased course, stored as the client sent it.
    pub product_id: String,
    pub product_cost: f64,
    pub utr_number: String,
    pub payment_image: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub user_email: String,
    pub product_id: String,
    pub product_cost: f64,
    pub utr_number: String,
    pub payment_image: String,
    pub status: String,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = payments)]
pub struct UpdatePayment {
    pub user_email: Option<String>,
    pub product_id: Option<String>,
    pub product_cost: Option<f64>,
    pub utr_number: Option<String>,
    pub payment_image: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
