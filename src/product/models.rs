use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::products;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub original_price: f64,
    pub offer_percentage: f64,
    pub image: String,
    pub sold: i32,
    /// Advisory: orders never decrement it.
    pub stock: i32,
    pub highlights: Vec<String>,
    pub service: Vec<String>,
    pub description: String,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub original_price: f64,
    pub offer_percentage: f64,
    pub image: String,
    pub sold: i32,
    pub stock: i32,
    pub highlights: Vec<String>,
    pub service: Vec<String>,
    pub description: String,
    pub uploaded_by: String,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = products)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub original_price: Option<f64>,
    pub offer_percentage: Option<f64>,
    pub image: Option<String>,
    pub sold: Option<i32>,
    pub stock: Option<i32>,
    pub highlights: Option<Vec<String>>,
    pub service: Option<Vec<String>>,
    pub description: Option<String>,
    pub uploaded_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
