use crate::api::ErrorResponse;
use crate::get_conn;
use crate::images::{is_supported_content_type, MAX_IMAGE_SIZE};
use crate::models::NewImage;
use crate::schema::{images, upload_tickets};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadImageResponse {
    pub storage_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/images/upload/{ticket}",
    tag = "images",
    params(
        ("ticket" = Uuid, Path, description = "Upload ticket from /api/images/upload-url")
    ),
    request_body(content_type = "image/*", content = Vec<u8>),
    responses(
        (status = 201, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 404, description = "Invalid or expired upload ticket", body = ErrorResponse),
        (status = 413, description = "Payload too large", body = ErrorResponse)
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    Path(ticket): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    if !is_supported_content_type(&content_type) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unsupported content type: {content_type}"),
            }),
        )
            .into_response();
    }

    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Empty upload body".to_string(),
            }),
        )
            .into_response();
    }

    if body.len() > MAX_IMAGE_SIZE {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse {
                error: format!("Image too large. Maximum size is {} bytes", MAX_IMAGE_SIZE),
            }),
        )
            .into_response();
    }

    let mut conn = get_conn!(state.pool);

    // Consume the ticket and store the blob in one transaction. The
    // conditional update makes a second upload against the same ticket
    // lose the race, and a failed insert rolls the consumption back so
    // the ticket stays usable.
    let stored: Result<Option<Uuid>, diesel::result::Error> = conn.transaction(|conn| {
        let owner: Option<Uuid> = diesel::update(
            upload_tickets::table
                .filter(upload_tickets::id.eq(ticket))
                .filter(upload_tickets::used_at.is_null())
                .filter(upload_tickets::expires_at.gt(Utc::now())),
        )
        .set(upload_tickets::used_at.eq(Some(Utc::now())))
        .returning(upload_tickets::user_id)
        .get_result(conn)
        .optional()?;

        let Some(user_id) = owner else {
            return Ok(None);
        };

        let new_image = NewImage {
            user_id,
            content_type: &content_type,
            data: &body,
        };

        diesel::insert_into(images::table)
            .values(&new_image)
            .returning(images::id)
            .get_result::<Uuid>(conn)
            .map(Some)
    });

    match stored {
        Ok(Some(storage_id)) => {
            tracing::debug!(%storage_id, size = body.len(), "stored image blob");
            (StatusCode::CREATED, Json(UploadImageResponse { storage_id })).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Invalid or expired upload ticket".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to store image: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to store image".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MIGRATIONS;
    use crate::models::{NewUploadTicket, NewUser};
    use crate::schema::users;
    use chrono::{DateTime, Duration};
    use diesel::{Connection, PgConnection};
    use diesel_migrations::MigrationHarness;

    fn conn() -> PgConnection {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
        let mut conn = PgConnection::establish(&url).expect("Failed to connect to Postgres");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
        conn.begin_test_transaction()
            .expect("Failed to start test transaction");
        conn
    }

    #[test]
    #[ignore = "requires a migrated Postgres at DATABASE_URL"]
    fn failed_store_rolls_ticket_consumption_back() {
        let mut conn = conn();
        let username = format!("user-{}", Uuid::new_v4());
        let user_id: Uuid = diesel::insert_into(users::table)
            .values(&NewUser {
                username: &username,
                password_hash: "unused",
            })
            .returning(users::id)
            .get_result(&mut conn)
            .unwrap();

        let ticket: Uuid = diesel::insert_into(upload_tickets::table)
            .values(&NewUploadTicket {
                user_id,
                expires_at: Utc::now() + Duration::hours(1),
            })
            .returning(upload_tickets::id)
            .get_result(&mut conn)
            .unwrap();

        // Consume the ticket, then fail the transaction the way a failed
        // blob insert would.
        let result: Result<(), diesel::result::Error> = conn.transaction(|conn| {
            let consumed: Option<Uuid> = diesel::update(
                upload_tickets::table
                    .filter(upload_tickets::id.eq(ticket))
                    .filter(upload_tickets::used_at.is_null())
                    .filter(upload_tickets::expires_at.gt(Utc::now())),
            )
            .set(upload_tickets::used_at.eq(Some(Utc::now())))
            .returning(upload_tickets::user_id)
            .get_result(conn)
            .optional()?;
            assert!(consumed.is_some());
            Err(diesel::result::Error::RollbackTransaction)
        });
        assert!(result.is_err());

        let used_at: Option<DateTime<Utc>> = upload_tickets::table
            .filter(upload_tickets::id.eq(ticket))
            .select(upload_tickets::used_at)
            .first(&mut conn)
            .unwrap();
        assert!(used_at.is_none());
    }
}
