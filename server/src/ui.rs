use axum::response::Html;

/// The donations page: an entry form and a table of all donations.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
