use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::courses;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub course_name: String,
    pub image: String,
    pub video: String,
    pub description: String,
    pub old_price: f64,
    pub new_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = courses)]
pub struct NewCourse {
    pub course_name: String,
    pub image: String,
    pub video: String,
    pub description: String,
    pub old_price: f64,
    pub new_price: f64,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = courses)]
pub struct UpdateCourse {
    pub course_name: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub description: Option<String>,
    pub old_price: Option<f64>,
    pub new_price: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}
