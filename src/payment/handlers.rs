use std::sync::Arc;

use super::models::{DEFAULT_STATUS, NewPayment, Payment, UpdatePayment};
use crate::schema::payments;
use crate::storage::FileStores;
use crate::upload::FormPayload;
use crate::utils::{AppError, MessageResponse, Pool, internal_error, parse_id};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

const NOT_FOUND: &str = "Payment not found";

pub async fn create_payment(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    mut form: FormPayload,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let product_cost = form.number::<f64>("productCost")?;
    let image_file = form.take_file("paymentImage");

    let (Some(user_email), Some(product_id), Some(product_cost), Some(utr_number), Some(image_file)) = (
        form.text("userEmail"),
        form.text("productId"),
        product_cost,
        form.text("utrNumber"),
        image_file,
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let payment_image = files.payment_proofs.put(&image_file).await?;

    let new_payment = NewPayment {
        user_email,
        product_id,
        product_cost,
        utr_number,
        payment_image,
        status: DEFAULT_STATUS.to_owned(),
    };

    let res = diesel::insert_into(payments::table)
        .values(&new_payment)
        .returning(Payment::as_returning())
        .get_result(&mut conn)
        .await;

    match res {
        Ok(payment) => {
            tracing::info!(id = %payment.id, course = %payment.product_id, "payment recorded");
            Ok((StatusCode::CREATED, Json(payment)))
        }
        Err(err) => {
            files.payment_proofs.discard(&new_payment.payment_image).await;
            Err(internal_error(err))
        }
    }
}

pub async fn get_payments(State(pool): State<Pool>) -> Result<Json<Vec<Payment>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = payments::table
        .select(Payment::as_select())
        .order(payments::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok(Json(res))
}

pub async fn get_payments_by_email(
    State(pool): State<Pool>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = payments_for_email(&mut conn, &email).await?;

    if res.is_empty() {
        return Err(AppError::NothingFound(
            "No payments found for this email".to_owned(),
        ));
    }

    Ok(Json(res))
}

/// Newest first.
pub async fn payments_for_email(
    conn: &mut diesel_async::AsyncPgConnection,
    email: &str,
) -> Result<Vec<Payment>, AppError> {
    payments::table
        .filter(payments::user_email.eq(email))
        .select(Payment::as_select())
        .order(payments::created_at.desc())
        .load(conn)
        .await
        .map_err(internal_error)
}

pub async fn get_payment_by_id(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = payments::table
        .find(id)
        .select(Payment::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(res))
}

pub async fn update_payment(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
    mut form: FormPayload,
) -> Result<Json<Payment>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;

    let mut changes = UpdatePayment {
        user_email: form.text("userEmail"),
        product_id: form.text("productId"),
        product_cost: form.number("productCost")?,
        utr_number: form.text("utrNumber"),
        payment_image: None,
        status: form.text("status"),
        updated_at: Some(Utc::now()),
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    if let Some(file) = form.take_file("paymentImage") {
        changes.payment_image = Some(files.payment_proofs.put(&file).await?);
    }

    let res = diesel::update(payments::table.find(id))
        .set(&changes)
        .returning(Payment::as_returning())
        .get_result(&mut conn)
        .await
        .optional();

    match res {
        Ok(Some(payment)) => Ok(Json(payment)),
        Ok(None) => {
            if let Some(image) = &changes.payment_image {
                files.payment_proofs.discard(image).await;
            }
            Err(AppError::not_found(NOT_FOUND))
        }
        Err(err) => {
            if let Some(image) = &changes.payment_image {
                files.payment_proofs.discard(image).await;
            }
            Err(internal_error(err))
        }
    }
}

pub async fn delete_payment(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(payments::table.find(id))
        .returning(Payment::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    files.payment_proofs.discard(&deleted.payment_image).await;

    Ok(Json(MessageResponse {
        message: "Payment deleted successfully",
    }))
}
