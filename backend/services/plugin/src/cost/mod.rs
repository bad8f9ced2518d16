pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cost/get_linked_accounts", post(handlers::get_linked_accounts))
        .route("/cost/get_data", post(handlers::get_data))
}
