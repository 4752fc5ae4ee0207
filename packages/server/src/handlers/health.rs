use axum::Json;
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
    #[schema(example = "alive")]
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Liveness probe",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "alive",
    })
}
