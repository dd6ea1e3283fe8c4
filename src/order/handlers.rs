use std::sync::Arc;

use super::models::{NewOrder, Order, OrderStatus, UpdateOrder};
use crate::schema::orders;
use crate::storage::FileStores;
use crate::upload::{FormPayload, ImagesOnly};
use crate::utils::{AppError, MessageResponse, Pool, internal_error, parse_id};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

const NOT_FOUND: &str = "Order not found";
const MISSING_FIELDS: &str = "All fields (name, email, address, phoneNumber, productId, productName, quantity, totalAmount, transactionId, status) are required";

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::validation("Invalid order status"))
}

fn parse_product_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation("Invalid value for productId"))
}

fn check_quantity(quantity: i32) -> Result<i32, AppError> {
    if quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    Ok(quantity)
}

pub async fn create_order(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    mut form: FormPayload<ImagesOnly>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let quantity = form.number::<i32>("quantity")?;
    let total_amount = form.number::<f64>("totalAmount")?;

    let (
        Some(name),
        Some(email),
        Some(address),
        Some(phone_number),
        Some(product_id),
        Some(product_name),
        Some(quantity),
        Some(total_amount),
        Some(transaction_id),
        Some(product_owner),
    ) = (
        form.trimmed("name"),
        form.trimmed("email"),
        form.trimmed("address"),
        form.trimmed("phoneNumber"),
        form.trimmed("productId"),
        form.trimmed("productName"),
        quantity,
        total_amount,
        form.trimmed("transactionId"),
        form.trimmed("productOwner"),
    )
    else {
        return Err(AppError::validation(MISSING_FIELDS));
    };

    let product_id = parse_product_id(&product_id)?;
    let quantity = check_quantity(quantity)?;
    let status = match form.trimmed("status") {
        Some(raw) => parse_status(&raw)?,
        None => OrderStatus::Pending,
    };

    let Some(screenshot) = form.take_file("paymentScreenshot") else {
        return Err(AppError::validation("Payment screenshot is required"));
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let payment_screenshot = files.order_proofs.put_qualified(&screenshot).await?;

    let new_order = NewOrder {
        name,
        email,
        address,
        phone_number,
        product_id,
        product_name,
        quantity,
        total_amount,
        transaction_id,
        payment_screenshot,
        status,
        product_owner,
    };

    // stock is advisory: the product row is left untouched
    let res = diesel::insert_into(orders::table)
        .values(&new_order)
        .returning(Order::as_returning())
        .get_result(&mut conn)
        .await;

    match res {
        Ok(order) => {
            tracing::info!(id = %order.id, product = %order.product_id, "order created");
            Ok((StatusCode::CREATED, Json(order)))
        }
        Err(err) => {
            files.order_proofs.discard(&new_order.payment_screenshot).await;
            Err(internal_error(err))
        }
    }
}

pub async fn get_orders(State(pool): State<Pool>) -> Result<Json<Vec<Order>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = orders::table
        .select(Order::as_select())
        .order(orders::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok(Json(res))
}

pub async fn get_order_by_id(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = orders::table
        .find(id)
        .select(Order::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(res))
}

pub async fn get_orders_by_email(
    State(pool): State<Pool>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Order>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = orders::table
        .filter(orders::email.eq(&email))
        .select(Order::as_select())
        .order(orders::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    if res.is_empty() {
        return Err(AppError::not_found("No orders found for this email"));
    }

    Ok(Json(res))
}

pub async fn get_orders_by_owner(
    State(pool): State<Pool>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Order>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = orders::table
        .filter(orders::product_owner.eq(&email))
        .select(Order::as_select())
        .order(orders::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    if res.is_empty() {
        return Err(AppError::not_found("No orders found for this product owner"));
    }

    Ok(Json(res))
}

pub async fn update_order_status(
    State(pool): State<Pool>,
    Path(id): Path<String>,
    form: FormPayload,
) -> Result<Json<Order>, AppError> {
    let Some(status) = form.trimmed("status") else {
        return Err(AppError::validation("Status field is required"));
    };
    let status = parse_status(&status)?;
    let id = parse_id(&id, NOT_FOUND)?;

    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = diesel::update(orders::table.find(id))
        .set((orders::status.eq(status), orders::updated_at.eq(Utc::now())))
        .returning(Order::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    tracing::info!(id = %res.id, status = %res.status, "order status changed");

    Ok(Json(res))
}

pub async fn update_order(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
    mut form: FormPayload<ImagesOnly>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;

    let mut changes = UpdateOrder {
        name: form.trimmed("name"),
        email: form.trimmed("email"),
        address: form.trimmed("address"),
        phone_number: form.trimmed("phoneNumber"),
        product_id: form.trimmed("productId").as_deref().map(parse_product_id).transpose()?,
        product_name: form.trimmed("productName"),
        quantity: form.number("quantity")?.map(check_quantity).transpose()?,
        total_amount: form.number("totalAmount")?,
        transaction_id: form.trimmed("transactionId"),
        payment_screenshot: None,
        status: form.trimmed("status").as_deref().map(parse_status).transpose()?,
        product_owner: form.trimmed("productOwner"),
        updated_at: Some(Utc::now()),
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    if let Some(file) = form.take_file("paymentScreenshot") {
        changes.payment_screenshot = Some(files.order_proofs.put_qualified(&file).await?);
    }

    let res = diesel::update(orders::table.find(id))
        .set(&changes)
        .returning(Order::as_returning())
        .get_result(&mut conn)
        .await
        .optional();

    match res {
        Ok(Some(order)) => Ok(Json(order)),
        Ok(None) => {
            if let Some(screenshot) = &changes.payment_screenshot {
                files.order_proofs.discard(screenshot).await;
            }
            Err(AppError::not_found(NOT_FOUND))
        }
        Err(err) => {
            if let Some(screenshot) = &changes.payment_screenshot {
                files.order_proofs.discard(screenshot).await;
            }
            Err(internal_error(err))
        }
    }
}

pub async fn delete_order(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(orders::table.find(id))
        .returning(Order::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    files.order_proofs.discard(&deleted.payment_screenshot).await;

    Ok(Json(MessageResponse {
        message: "Order deleted successfully",
    }))
}
