use std::sync::Arc;

use super::models::{NewUser, QrCodeResponse, SafeUser, UpdateUser, User, UserResponse};
use crate::notification::{Mailer, Notification, PasswordResetNotification};
use crate::schema::users;
use crate::storage::FileStores;
use crate::upload::FormPayload;
use crate::utils::{AppError, MessageResponse, Pool, internal_error, parse_id};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rand::Rng;

const NOT_FOUND: &str = "User not found";

pub async fn create_user(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    mut form: FormPayload,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let (Some(name), Some(email), Some(phone), Some(address), Some(password), Some(user_type)) = (
        form.text("name"),
        form.text("email"),
        form.text("phone"),
        form.text("address"),
        form.text("password"),
        form.text("type"),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let password = create_password_hash(password).await?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let qrcode_image = match form.take_file("qrcodeImage") {
        Some(file) => Some(files.qrcodes.put(&file).await?),
        None => None,
    };

    let user_data = NewUser {
        name,
        email,
        phone,
        address,
        password,
        user_type,
        qrcode_image,
    };

    let res = diesel::insert_into(users::table)
        .values(&user_data)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await;

    match res {
        Ok(user) => {
            tracing::info!(id = %user.id, "user registered");
            Ok((
                StatusCode::CREATED,
                Json(UserResponse {
                    message: "User created successfully",
                    user,
                }),
            ))
        }
        Err(err) => {
            if let Some(qrcode) = &user_data.qrcode_image {
                files.qrcodes.discard(qrcode).await;
            }
            Err(internal_error(err))
        }
    }
}

pub async fn get_all_users(State(pool): State<Pool>) -> Result<Json<Vec<SafeUser>>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = users::table
        .select(SafeUser::as_select())
        .order(users::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(internal_error)?;

    Ok(Json(res))
}

pub async fn get_user_by_id(
    State(pool): State<Pool>,
    Path(id): Path<String>,
) -> Result<Json<SafeUser>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let res = users::table
        .find(id)
        .select(SafeUser::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(res))
}

pub async fn get_qrcode_by_email(
    State(pool): State<Pool>,
    Path(email): Path<String>,
) -> Result<Json<QrCodeResponse>, AppError> {
    let mut conn = pool.get().await.map_err(internal_error)?;

    let user = find_user_by_email(&mut conn, &email)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(QrCodeResponse {
        qrcode_image: user.qrcode_image,
    }))
}

pub async fn update_qrcode(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
    mut form: FormPayload,
) -> Result<Json<UserResponse>, AppError> {
    let Some(file) = form.take_file("qrcodeImage") else {
        return Err(AppError::validation("QR code image is required"));
    };
    let id = parse_id(&id, NOT_FOUND)?;

    let mut conn = pool.get().await.map_err(internal_error)?;

    let qrcode = files.qrcodes.put(&file).await?;

    let res = diesel::update(users::table.find(id))
        .set((
            users::qrcode_image.eq(Some(&qrcode)),
            users::updated_at.eq(Utc::now()),
        ))
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .optional();

    match res {
        Ok(Some(user)) => Ok(Json(UserResponse {
            message: "QR code updated successfully",
            user,
        })),
        Ok(None) => {
            files.qrcodes.discard(&qrcode).await;
            Err(AppError::not_found(NOT_FOUND))
        }
        Err(err) => {
            files.qrcodes.discard(&qrcode).await;
            Err(internal_error(err))
        }
    }
}

pub async fn update_user(
    State(pool): State<Pool>,
    Path(id): Path<String>,
    form: FormPayload,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;

    let password = match form.text("password") {
        Some(password) => Some(create_password_hash(password).await?),
        None => None,
    };

    let changes = UpdateUser {
        name: form.text("name"),
        email: form.text("email"),
        phone: form.text("phone"),
        address: form.text("address"),
        password,
        user_type: form.text("type"),
        updated_at: Some(Utc::now()),
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let user = diesel::update(users::table.find(id))
        .set(&changes)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(UserResponse {
        message: "User updated successfully",
        user,
    }))
}

pub async fn delete_user(
    State(pool): State<Pool>,
    State(files): State<Arc<FileStores>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut conn = pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(users::table.find(id))
        .returning(User::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(internal_error)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    if let Some(qrcode) = &deleted.qrcode_image {
        files.qrcodes.discard(qrcode).await;
    }

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

pub async fn login_user(
    State(pool): State<Pool>,
    form: FormPayload,
) -> Result<Json<UserResponse>, AppError> {
    let (Some(email), Some(password)) = (form.text("email"), form.text("password")) else {
        return Err(AppError::validation("Email and password are required"));
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let user = find_user_by_email(&mut conn, &email)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    if !verify_password(password, user.password.clone()).await? {
        tracing::debug!(id = %user.id, "login rejected");
        return Err(AppError::validation("Invalid credentials"));
    }

    Ok(Json(UserResponse {
        message: "Login successful",
        user: user.into(),
    }))
}

pub async fn forgot_password(
    State(pool): State<Pool>,
    State(mailer): State<Mailer>,
    form: FormPayload,
) -> Result<Json<MessageResponse>, AppError> {
    let Some(email) = form.text("email") else {
        return Err(AppError::validation("Email is required"));
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let user = find_user_by_email(&mut conn, &email)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    let otp = generate_otp();

    diesel::update(users::table.find(user.id))
        .set((users::otp.eq(Some(&otp)), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)
        .await
        .map_err(internal_error)?;

    // the code stays stored even when delivery fails
    mailer
        .send(Notification::PasswordReset(PasswordResetNotification {
            email: user.email,
            otp,
        }))
        .await?;

    Ok(Json(MessageResponse {
        message: "OTP sent successfully",
    }))
}

pub async fn reset_password(
    State(pool): State<Pool>,
    form: FormPayload,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(email), Some(otp), Some(new_password)) = (
        form.text("email"),
        form.text("otp"),
        form.text("newPassword"),
    ) else {
        return Err(AppError::validation("Email, OTP and new password are required"));
    };

    let mut conn = pool.get().await.map_err(internal_error)?;

    let user = find_user_by_email(&mut conn, &email)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    if user.otp.as_deref() != Some(otp.as_str()) {
        return Err(AppError::validation("Invalid OTP"));
    }

    let password = create_password_hash(new_password).await?;

    // compare-and-clear: a code can only be consumed once
    let updated = diesel::update(
        users::table
            .filter(users::id.eq(user.id))
            .filter(users::otp.eq(&otp)),
    )
    .set((
        users::password.eq(&password),
        users::otp.eq(None::<String>),
        users::updated_at.eq(Utc::now()),
    ))
    .execute(&mut conn)
    .await
    .map_err(internal_error)?;

    if updated == 0 {
        return Err(AppError::validation("Invalid OTP"));
    }

    tracing::info!(id = %user.id, "password reset");

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

/// Oldest account with this email; emails are not unique.
async fn find_user_by_email(
    conn: &mut AsyncPgConnection,
    email: &str,
) -> Result<Option<User>, AppError> {
    users::table
        .filter(users::email.eq(email))
        .order(users::created_at.asc())
        .select(User::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(internal_error)
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

async fn create_password_hash(password: String) -> Result<String, AppError> {
    let hashed_password = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Hashing error: {}", e)))?;

    Ok(hashed_password)
}

/// A stored value that isn't a bcrypt hash never matches.
async fn verify_password(password: String, hashed: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify(password, &hashed).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert!(!otp.starts_with('0'));
        }
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = create_password_hash("s3cret".to_owned()).await.unwrap();
        assert_ne!(hashed, "s3cret");
        assert!(verify_password("s3cret".to_owned(), hashed.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_owned(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn plaintext_stored_password_never_matches() {
        assert!(!verify_password("s3cret".to_owned(), "s3cret".to_owned()).await.unwrap());
    }
}
