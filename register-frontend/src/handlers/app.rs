use axum::response::{IntoResponse, Redirect};

pub async fn index() -> impl IntoResponse {
    Redirect::to("/register")
}

pub async fn health_check() -> &'static str {
    "OK"
}
