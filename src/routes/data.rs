/// Protected data routes
///
/// Profile lookup, the posts/users listing, and post creation. The
/// gate has already validated the token; handlers only apply role
/// checks on top of the injected claims.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::store::{self, Post, Role, User};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_CONTENT_LENGTH: usize = 10_000;

#[derive(Deserialize)]
pub struct DataQuery {
    #[serde(rename = "type")]
    pub data_type: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author,
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/profile
///
/// The authenticated user's own record.
pub async fn get_profile(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user = store::get_user(pool.get_ref(), &claims.sub)
        .await?
        .ok_or_else(|| {
            // Token outlived the account
            AppError::Database(DatabaseError::NotFound("User not found".to_string()))
        })?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// GET /api/data?type=posts|users
///
/// `posts` is available to any authenticated user; `users` requires
/// the admin role.
///
/// # Errors
/// - 400: unknown type value
/// - 403: `users` requested without the admin role
pub async fn get_data(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
    query: web::Query<DataQuery>,
) -> Result<HttpResponse, AppError> {
    match query.data_type.as_deref().unwrap_or("posts") {
        "posts" => {
            let posts: Vec<PostResponse> = store::list_posts(pool.get_ref())
                .await?
                .into_iter()
                .map(PostResponse::from)
                .collect();

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "data": posts,
                "count": posts.len(),
                "requested_by": claims.sub,
            })))
        }
        "users" => {
            if !claims.is_admin() {
                tracing::warn!(sub = %claims.sub, "Non-admin requested the user listing");
                return Err(AppError::Auth(AuthError::InsufficientRole));
            }

            let users = store::list_users(pool.get_ref()).await?;
            let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "users": users,
                "count": users.len(),
            })))
        }
        other => {
            tracing::debug!(data_type = other, "Unknown data type requested");
            Err(AppError::Validation(ValidationError::InvalidFormat(
                "Invalid data type".to_string(),
            )))
        }
    }
}

/// POST /api/posts
///
/// Creates a post authored by the authenticated user.
pub async fn create_post(
    claims: web::ReqData<Claims>,
    form: web::Json<CreatePostRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let title = form.title.trim();
    let content = form.content.trim();

    if title.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "title".to_string(),
        )));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "title".to_string(),
            MAX_TITLE_LENGTH,
        )));
    }
    if content.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "content".to_string(),
        )));
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "content".to_string(),
            MAX_CONTENT_LENGTH,
        )));
    }

    let post_id = store::create_post(pool.get_ref(), title, content, &claims.sub).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Post created successfully",
        "post_id": post_id,
    })))
}
