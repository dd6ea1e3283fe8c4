use std::sync::Arc;

use super::models::{NewProduct, Product, UpdateProduct};
use crate::schema::products;
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

const NOT_FOUND: &str = "Product not found";
const MISSING_FIELDS: &str = "All fields (name, originalPrice, stock, description, highlights, service,uploadedBy) are required";

pub async fn create_product(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    mut form: FormPayload<ImagesOnly>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let original_price = form.number::<f64>("originalPrice")?;
    let stock = form.number::<i32>("stock")?;

    let (
        Some(name),
        Some(original_price),
        Some(stock),
        Some(description),
        Some(highlights),
        Some(service),
        Some(uploaded_by),
    ) = (
        form.text("name"),
        original_price,
        stock,
        form.text("description"),
        form.list("highlights"),
        form.list("service"),
        form.text("uploadedBy"),
    )
    else {
        return Err(AppError::validation(MISSING_FIELDS));
    };

    let Some(image_file) = form.take_file("image") else {
        return Err(AppError::validation("Product image is required"));
    };

    let offer_percentage = form.number::<f64>("offerPercentage")?.unwrap_or_default();
    let sold = form.number::<i32>("sold")?.unwrap_or_default();

    let mut conn = pool.get().await.map_err(internal_error)?;

    let image = files.media.put_qualified(&image_file).await?;

    let new_product = NewProduct {
        name,
        original_price,
        offer_percentage,
        image,
        sold,
        stock,
        highlights,
        service,
        description,
        uploaded_by,
    };

    let res = diesel::insert_into(products::table)
        .values(&new_product)
        .returning(Product::as_returning())
        .get_result(&mut conn)
        .await;

    match res {
        Ok(product) => {
            tracing::info!(id = %product.id, owner = %product.uploaded_by, "product created");
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(err) => {
            files.media.discard(&new_product.image).await;
            Err(internal_error(err))
        }
    }
}

pub async fn get_products(State(pool): State<Pool>) -> Result<Json<Vec<Product>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = products::table
        .select(Product::as_select())
        .order(products::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok(Json(res))
}

pub async fn get_product_by_id(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = products::table
        .find(id)
        .select(Product::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(res))
}

pub async fn get_products_by_owner(
    State(pool): State<Pool>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = products::table
        .filter(products::uploaded_by.eq(&email))
        .select(Product::as_select())
        .order(products::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    if res.is_empty() {
        return Err(AppError::not_found("No products found for this user"));
    }

    Ok(Json(res))
}

pub async fn update_product(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
    mut form: FormPayload<ImagesOnly>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;

    let mut changes = UpdateProduct {
        name: form.text("name"),
        original_price: form.number("originalPrice")?,
        offer_percentage: form.number("offerPercentage")?,
        image: None,
        sold: form.number("sold")?,
        stock: form.number("stock")?,
        highlights: form.list("highlights"),
        service: form.list("service"),
        description: form.text("description"),
        uploaded_by: form.text("uploadedBy"),
        updated_at: Some(Utc::now()),
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    if let Some(file) = form.take_file("image") {
        changes.image = Some(files.media.put_qualified(&file).await?);
    }

    let res = diesel::update(products::table.find(id))
        .set(&changes)
        .returning(Product::as_returning())
        .get_result(&mut conn)
        .await
        .optional();

    match res {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => {
            if let Some(image) = &changes.image {
                files.media.discard(image).await;
            }
            Err(AppError::not_found(NOT_FOUND))
        }
        Err(err) => {
            if let Some(image) = &changes.image {
                files.media.discard(image).await;
            }
            Err(internal_error(err))
        }
    }
}

pub async fn remove_product(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(products::table.find(id))
        .returning(Product::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    files.media.discard(&deleted.image).await;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
