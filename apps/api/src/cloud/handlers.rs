use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};

use crate::cloud::page::{render_index, PageContent};
use crate::cloud::pipeline::{process_upload, CloudReport};
use crate::cloud::upload::read_file_field;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /
pub async fn handle_index() -> Html<String> {
    Html(render_index(PageContent::Empty))
}

/// POST /
///
/// Missing file → redirect back to the form. Failures are shown on the page.
pub async fn handle_upload_page(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_file_field(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return Redirect::to("/").into_response(),
        Err(e) => return page_error(e),
    };

    match process_upload(&state, upload).await {
        Ok(report) => Html(render_index(PageContent::Cloud(&report))).into_response(),
        Err(e) => page_error(e),
    }
}

/// POST /api/v1/wordcloud
pub async fn handle_generate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CloudReport>, AppError> {
    let upload = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let report = process_upload(&state, upload).await?;
    Ok(Json(report))
}

fn page_error(err: AppError) -> Response {
    let (status, _, message) = err.parts();
    (status, Html(render_index(PageContent::Message(&message)))).into_response()
}
