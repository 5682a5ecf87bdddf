use axum::{Router, routing::get};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::healthcheck))
        .route(
            "/api/v1/highlights/",
            get(handler::list_highlights).post(handler::create_highlights),
        )
}
