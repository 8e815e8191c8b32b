use crate::state::AppState;
use axum::{
    routing::{post, put},
    Router,
};

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/:id", put(handlers::update).delete(handlers::delete))
}
