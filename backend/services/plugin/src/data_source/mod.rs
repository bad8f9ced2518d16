pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data_source/init", post(handlers::init))
        .route("/data_source/verify", post(handlers::verify))
}
