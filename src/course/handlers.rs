use std::sync::Arc;

use super::models::{Course, NewCourse, UpdateCourse};
use crate::schema::courses;
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

const NOT_FOUND: &str = "Course not found";

pub async fn create_course(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    mut form: FormPayload,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let image_file = form.take_file("image");
    let video_file = form.take_file("video");

    let old_price = form.number::<f64>("oldPrice")?;
    let new_price = form.number::<f64>("newPrice")?;

    // an uploaded file wins over a reference sent as a plain field
    let has_image = image_file.is_some() || form.text("image").is_some();
    let has_video = video_file.is_some() || form.text("video").is_some();

    let (Some(course_name), Some(description), Some(old_price), Some(new_price), true, true) = (
        form.text("courseName"),
        form.text("description"),
        old_price,
        new_price,
        has_image,
        has_video,
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let image_ref = match &image_file {
        Some(_) => None,
        None => media_reference(&files, &form, "image").await?,
    };
    let video_ref = match &video_file {
        Some(_) => None,
        None => media_reference(&files, &form, "video").await?,
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let mut stored = Vec::new();
    let image = match &image_file {
        Some(file) => {
            let name = files.media.put(file).await?;
            stored.push(name.clone());
            name
        }
        None => image_ref.unwrap_or_default(),
    };
    let video = match &video_file {
        Some(file) => match files.media.put(file).await {
            Ok(name) => {
                stored.push(name.clone());
                name
            }
            Err(err) => {
                files.media.discard_all(&stored).await;
                return Err(err.into());
            }
        },
        None => video_ref.unwrap_or_default(),
    };

    let new_course = NewCourse {
        course_name,
        image,
        video,
        description,
        old_price,
        new_price,
    };

    let res = diesel::insert_into(courses::table)
        .values(&new_course)
        .returning(Course::as_returning())
        .get_result(&mut conn)
        .await;

    match res {
        Ok(course) => {
            tracing::info!(id = %course.id, "course created");
            Ok((StatusCode::CREATED, Json(course)))
        }
        Err(err) => {
            files.media.discard_all(&stored).await;
            Err(internal_error(err))
        }
    }
}

pub async fn get_courses(State(pool): State<Pool>) -> Result<Json<Vec<Course>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = courses::table
        .select(Course::as_select())
        .order(courses::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok(Json(res))
}

pub async fn get_course_by_id(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = courses::table
        .find(id)
        .select(Course::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(res))
}

pub async fn update_course(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
    mut form: FormPayload,
) -> Result<Json<Course>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;

    let image = match form.has_file("image") {
        true => None,
        false => media_reference(&files, &form, "image").await?,
    };
    let video = match form.has_file("video") {
        true => None,
        false => media_reference(&files, &form, "video").await?,
    };

    let mut changes = UpdateCourse {
        course_name: form.text("courseName"),
        description: form.text("description"),
        old_price: form.number("oldPrice")?,
        new_price: form.number("newPrice")?,
        image,
        video,
        updated_at: Some(Utc::now()),
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let mut stored = Vec::new();
    if let Some(file) = form.take_file("image") {
        let name = files.media.put(&file).await?;
        stored.push(name.clone());
        changes.image = Some(name);
    }
    if let Some(file) = form.take_file("video") {
        match files.media.put(&file).await {
            Ok(name) => {
                stored.push(name.clone());
                changes.video = Some(name);
            }
            Err(err) => {
                files.media.discard_all(&stored).await;
                return Err(err.into());
            }
        }
    }

    let res = diesel::update(courses::table.find(id))
        .set(&changes)
        .returning(Course::as_returning())
        .get_result(&mut conn)
        .await
        .optional();

    match res {
        Ok(Some(course)) => Ok(Json(course)),
        Ok(None) => {
            files.media.discard_all(&stored).await;
            Err(AppError::not_found(NOT_FOUND))
        }
        Err(err) => {
            files.media.discard_all(&stored).await;
            Err(internal_error(err))
        }
    }
}

pub async fn delete_course(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(courses::table.find(id))
        .returning(Course::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    files.media.discard(&deleted.image).await;
    files.media.discard(&deleted.video).await;

    Ok(Json(MessageResponse {
        message: "Course deleted successfully",
    }))
}

/// A media field sent as plain text. It may not name a file already in the media
/// bucket, since deleting the course removes whatever its fields point at.
async fn media_reference(
    files: &FileStores,
    form: &FormPayload,
    field: &str,
) -> Result<Option<String>, AppError> {
    let Some(reference) = form.text(field) else {
        return Ok(None);
    };
    if files.media.holds(&reference).await {
        return Err(AppError::validation(format!("Invalid value for {field}")));
    }
    Ok(Some(reference))
}
