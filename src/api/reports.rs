use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::AppError;
use crate::models::report::UsageReportView;
use crate::report::export::ExportFile;
use crate::report::{DateRange, ReportSession};
use crate::AppState;

async fn generate(state: &AppState, range: DateRange) -> Result<ReportSession, AppError> {
    let mut session = ReportSession::new(state.reports.clone());
    session.generate(range).await?;
    Ok(session)
}

fn attachment(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

/// GET /api/v1/reports/usage?from=&to=: per-gear activity with totals
pub async fn get_usage_report(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Json<UsageReportView>, AppError> {
    let session = generate(&state, range).await?;
    let view = session
        .report()
        .map(UsageReportView::from)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("report missing after generation")))?;
    Ok(Json(view))
}

/// GET /api/v1/reports/usage.csv?from=&to=
pub async fn download_usage_csv(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Response, AppError> {
    let session = generate(&state, range).await?;
    let file = session
        .download_as_csv()?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("report missing after generation")))?;
    Ok(attachment(file))
}

/// GET /api/v1/reports/usage.pdf?from=&to=
pub async fn download_usage_pdf(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Response, AppError> {
    let session = generate(&state, range).await?;
    let file = session
        .download_as_pdf()?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("report missing after generation")))?;
    Ok(attachment(file))
}
