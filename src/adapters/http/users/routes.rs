//! Axum router configuration for quota endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    add_user, can_create_deck, can_publish_deck, create_deck, delete_created_deck,
    delete_published_deck, delete_user, get_usage, publish_deck, UsersAppState,
};

/// Routes mounted under `/users`.
///
/// - `POST /` - Register a user
/// - `GET /:user_id` - Counters, limits and headroom
/// - `DELETE /:user_id` - Remove a user
/// - `GET /:user_id/can-create-deck`, `GET /:user_id/can-publish-deck`
/// - `POST /:user_id/create-deck`, `POST /:user_id/publish-deck`
/// - `POST /:user_id/delete-created-deck`, `POST /:user_id/delete-published-deck`
pub fn users_routes() -> Router<UsersAppState> {
    Router::new()
        .route("/", post(add_user))
        .route("/:user_id", get(get_usage).delete(delete_user))
        .route("/:user_id/can-create-deck", get(can_create_deck))
        .route("/:user_id/can-publish-deck", get(can_publish_deck))
        .route("/:user_id/create-deck", post(create_deck))
        .route("/:user_id/publish-deck", post(publish_deck))
        .route("/:user_id/delete-created-deck", post(delete_created_deck))
        .route("/:user_id/delete-published-deck", post(delete_published_deck))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryQuotaStore;
    use crate::application::QuotaService;

    fn test_state() -> UsersAppState {
        UsersAppState::new(Arc::new(QuotaService::new(Arc::new(
            InMemoryQuotaStore::new(),
        ))))
    }

    fn app() -> Router {
        Router::new()
            .nest("/users", users_routes())
            .with_state(test_state())
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/users/u1/archive-deck")
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/users/u1/create-deck")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn can_create_deck_route_answers_for_unknown_user() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/users/ghost/can-create-deck")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
