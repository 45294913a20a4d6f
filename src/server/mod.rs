pub mod handlers;

use crate::{config::Config, providers::ComicClient};
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

/// Shared by every worker; holds the clients built at startup.
pub struct AppState {
    pub client: Arc<ComicClient>,
}

impl AppState {
    pub fn new(client: ComicClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/generate_plot", web::post().to(handlers::generate_plot))
            .route("/generate", web::post().to(handlers::generate_image))
            .route("/generate", web::get().to(handlers::prediction_status))
            .route("/comic", web::post().to(handlers::generate_comic))
            .route("/history", web::get().to(handlers::list_history)),
    );
}

pub async fn run(config: &Config, client: ComicClient) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(client));
    let bind = (config.host.clone(), config.port());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
