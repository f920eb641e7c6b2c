//! Repository read endpoints.
//!
//! Every handler requires a session and passes the access gate first.

use actix_web::{HttpResponse, web};

use crate::auth::SessionAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{
    CollaboratorListResponse, CollaboratorResponse, RepositoryDetailResponse, RepositoryResponse,
    ReviewListResponse, ReviewResponse,
};
use crate::services::access::authorize_repository;

/// Get a repository with its collaborators and reviews.
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{repository_id}",
    tag = "Repositories",
    params(("repository_id" = i64, Path, description = "GitHub repository id")),
    responses(
        (status = 200, description = "Repository detail", body = RepositoryDetailResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "No access", body = crate::error::ErrorResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn get_repository(
    session: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let repository = authorize_repository(&pool, path.into_inner(), session.account_id()).await?;
    let collaborators = pool.list_collaborators(repository.id).await?;
    let reviews = pool.list_reviews(repository.id).await?;

    Ok(HttpResponse::Ok().json(RepositoryDetailResponse {
        repository: RepositoryResponse::from(repository),
        collaborators: collaborators
            .into_iter()
            .map(CollaboratorResponse::from)
            .collect(),
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
    }))
}

/// List the collaborators of a repository.
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{repository_id}/collaborators",
    tag = "Repositories",
    params(("repository_id" = i64, Path, description = "GitHub repository id")),
    responses(
        (status = 200, description = "Collaborators", body = CollaboratorListResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "No access", body = crate::error::ErrorResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_collaborators(
    session: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let repository = authorize_repository(&pool, path.into_inner(), session.account_id()).await?;
    let collaborators = pool.list_collaborators(repository.id).await?;

    Ok(HttpResponse::Ok().json(CollaboratorListResponse {
        collaborators: collaborators
            .into_iter()
            .map(CollaboratorResponse::from)
            .collect(),
    }))
}

/// List the reviews of a repository, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{repository_id}/reviews",
    tag = "Repositories",
    params(("repository_id" = i64, Path, description = "GitHub repository id")),
    responses(
        (status = 200, description = "Reviews", body = ReviewListResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "No access", body = crate::error::ErrorResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_reviews(
    session: SessionAuth,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let repository = authorize_repository(&pool, path.into_inner(), session.account_id()).await?;
    let reviews = pool.list_reviews(repository.id).await?;

    Ok(HttpResponse::Ok().json(ReviewListResponse {
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
    }))
}

/// Configure repository routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/repositories/{repository_id}").route(web::get().to(get_repository)))
        .service(
            web::resource("/repositories/{repository_id}/collaborators")
                .route(web::get().to(list_collaborators)),
        )
        .service(
            web::resource("/repositories/{repository_id}/reviews")
                .route(web::get().to(list_reviews)),
        );
}
