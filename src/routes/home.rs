use axum::response::Json;
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = RootResponse)
    ),
    tag = "General"
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "VideoBlobKit video ingestion service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: [
            "POST /users",
            "POST /login",
            "POST /videos",
            "GET /videos",
            "GET /videos/{id}",
            "DELETE /videos/{id}",
            "POST /videos/{id}/video",
            "POST /videos/{id}/thumbnail",
            "GET /swagger-ui",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    })
}
