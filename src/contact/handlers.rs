use super::models::{Contact, NewContact};
use crate::schema::contacts;
use crate::upload::FormPayload;
use crate::utils::{AppError, MessageResponse, Pool, internal_error, parse_id};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

const NOT_FOUND: &str = "Contact not found";

pub async fn create_contact(
    State(pool): State<Pool>,
    form: FormPayload,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    let (Some(name), Some(mobile_number), Some(message), Some(program)) = (
        form.text("name"),
        form.text("mobileNumber"),
        form.text("message"),
        form.text("program"),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = diesel::insert_into(contacts::table)
        .values(NewContact {
            name,
            mobile_number,
            message,
            program,
        })
        .returning(Contact::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn get_contacts(State(pool): State<Pool>) -> Result<Json<Vec<Contact>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = contacts::table
        .select(Contact::as_select())
        .order(contacts::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok(Json(res))
}

pub async fn get_contact_by_id(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = contacts::table
        .find(id)
        .select(Contact::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(res))
}

pub async fn delete_contact(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(contacts::table.find(id))
        .execute(&mut conn)
        .await
        .map_err(internal_error)?;

    if deleted == 0 {
        return Err(AppError::not_found(NOT_FOUND));
    }

    Ok(Json(MessageResponse {
        message: "Contact deleted successfully",
    }))
}
