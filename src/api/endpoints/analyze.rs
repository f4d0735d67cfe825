//! AOI analysis endpoint.

use axum::extract::State;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::{self, Analysis, AoiRequest};

/// `POST /analyze` (also mounted at `/api/aoi/analyze`) — run the
/// classification pipeline for a circular AOI.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Json(request): Json<AoiRequest>,
) -> Result<Json<Analysis>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id, aoi = %request.name);

    let analysis = pipeline::analyze(ctx.backend.as_ref(), &request)
        .instrument(span)
        .await?;

    Ok(Json(analysis))
}
