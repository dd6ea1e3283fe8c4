use std::collections::HashMap;

use super::models::{CourseDetails, PurchasedCourse};
use crate::course::models::Course;
use crate::payment::handlers::payments_for_email;
use crate::payment::models::Payment;
use crate::schema::courses;
use crate::utils::{AppError, Pool, internal_error};
use axum::extract::{Json, Path, State};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

/// Courses bought by `email`, newest payment first.
pub async fn get_user_courses(
    State(pool): State<Pool>,
    Path(email): Path<String>,
) -> Result<Json<Vec<PurchasedCourse>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let payments = payments_for_email(&mut conn, &email).await?;
    if payments.is_empty() {
        return Err(AppError::NothingFound(
            "No payments found for this email".to_owned(),
        ));
    }

    let ids = referenced_course_ids(&payments);
    let found = if ids.is_empty() {
        Vec::new()
    } else {
        courses::table
            .filter(courses::id.eq_any(&ids))
            .select(Course::as_select())
            .load(&mut conn)
            .await
            .map_err(internal_error)?
    };

    let purchases = pair_purchases(payments, found);
    tracing::debug!(%email, count = purchases.len(), "resolved purchased courses");

    Ok(Json(purchases))
}

/// Distinct course ids the payments point at; ids that aren't UUIDs can't match a course.
fn referenced_course_ids(payments: &[Payment]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = payments
        .iter()
        .filter_map(|p| Uuid::parse_str(&p.product_id).ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Keeps payment order and drops payments whose course is gone.
fn pair_purchases(payments: Vec<Payment>, courses: Vec<Course>) -> Vec<PurchasedCourse> {
    let by_id: HashMap<Uuid, Course> = courses.into_iter().map(|c| (c.id, c)).collect();

    payments
        .into_iter()
        .filter_map(|payment| {
            let id = Uuid::parse_str(&payment.product_id).ok()?;
            let course = by_id.get(&id)?;
            Some(PurchasedCourse {
                course_details: CourseDetails::from(course),
                payment_details: payment.into(),
            })
        })
        .collect()
}
