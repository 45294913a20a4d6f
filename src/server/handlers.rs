use crate::{
    error::ComicError,
    models::{
        DetailBody, ErrorBody, ImageRequest, ImageResponse, StatusQuery, StoryRequest, ViewState,
    },
    pipeline::ComicPipeline,
    server::AppState,
    viewer::HistoryViewer,
};
use actix_web::{http::StatusCode, web, HttpResponse};

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ComicError> {
    serde_json::from_slice(body)
        .map_err(|e| ComicError::ValidationError(format!("Invalid request body: {}", e)))
}

/// `POST /api/generate_plot`. Every failure, including an unreadable body,
/// answers 500 with the same generic message.
pub async fn generate_plot(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let result = match parse_body::<StoryRequest>(&body) {
        Ok(request) => state.client.generate_story(&request.prompt).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(story) => HttpResponse::Ok().json(story),
        Err(e) => {
            log::error!("Error generating story: {}", e);
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed to generate story"))
        }
    }
}

/// `POST /api/generate`. Blocks until the prediction settles; the provider's
/// error text comes back as `detail`.
pub async fn generate_image(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request = match parse_body::<ImageRequest>(&body) {
        Ok(request) => request,
        Err(e) => return HttpResponse::BadRequest().json(DetailBody::new(e.detail())),
    };

    match state.client.generate_images(&request.prompt).await {
        Ok(output) => HttpResponse::Ok().json(ImageResponse { output }),
        Err(e) => {
            log::error!("Image generation failed: {}", e);
            HttpResponse::InternalServerError().json(DetailBody::new(e.detail()))
        }
    }
}

/// `GET /api/generate?id=`. One status lookup, no waiting.
pub async fn prediction_status(
    state: web::Data<AppState>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    let id = match query.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return HttpResponse::BadRequest().json(ErrorBody::new("Missing prediction ID")),
    };

    match state.client.prediction_status(id).await {
        Ok(job) => match job.error.as_deref() {
            Some(error) => HttpResponse::InternalServerError().json(DetailBody::new(error)),
            None => HttpResponse::Ok().json(&job),
        },
        Err(e) => {
            log::error!("Status check for {} failed: {}", id, e);
            HttpResponse::InternalServerError().json(DetailBody::new(e.detail()))
        }
    }
}

/// `POST /api/comic`. Runs the whole pipeline server-side.
pub async fn generate_comic(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request = match parse_body::<StoryRequest>(&body) {
        Ok(request) => request,
        Err(e) => return HttpResponse::BadRequest().json(ErrorBody::new(e.to_string())),
    };

    let pipeline = ComicPipeline::new(state.client.clone());
    match pipeline.run(&request.prompt).await {
        Ok(strip) => HttpResponse::Ok().json(strip),
        Err(e) => {
            log::error!("Comic generation failed: {}", e);
            let status = match &e {
                ComicError::ValidationError(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            HttpResponse::build(status).json(ErrorBody::new(e.to_string()))
        }
    }
}

/// `GET /api/history`.
pub async fn list_history(state: web::Data<AppState>) -> HttpResponse {
    let mut viewer = HistoryViewer::new(state.client.history().clone());
    viewer.activate().await;

    match viewer.into_state() {
        ViewState::Ready(items) => HttpResponse::Ok().json(items),
        ViewState::Failed(message) => HttpResponse::BadGateway().json(ErrorBody::new(message)),
        ViewState::Loading => HttpResponse::InternalServerError()
            .json(ErrorBody::new("Failed to load history")),
    }
}
