use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use actix_files::Files;
use actix_multipart::form::MultipartFormConfig;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use actix_web_flash_messages::FlashMessagesFramework;
use actix_web_flash_messages::storage::CookieMessageStore;

use crate::domain::UploadRoot;
use crate::models::config::ServerConfig;
use crate::services::api::HttpImagesApi;
use crate::services::cache::ImageListCache;
use crate::services::ports::ImagesApi;
use crate::services::upload::UploadService;

pub mod domain;
pub mod forms;
pub mod models;
pub mod routes;
pub mod services;

/// Start the gallery server and block until it stops.
pub async fn run(server_config: ServerConfig) -> io::Result<()> {
    let secret_key = Key::try_from(server_config.secret.as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("secret: {e}")))?;

    std::fs::create_dir_all(&server_config.upload_path)?;

    let api: Arc<dyn ImagesApi> = Arc::new(HttpImagesApi::new(&server_config.api_base_url));
    let api = web::Data::from(api);
    let cache = web::Data::new(ImageListCache::default());
    let uploads = web::Data::new(UploadService::new(
        UploadRoot::from(PathBuf::from(&server_config.upload_path)),
        server_config.public_base_url.clone(),
    ));

    let upload_path = server_config.upload_path.clone();
    let secure_cookies = server_config.secure_cookies;
    let bind_address = (server_config.address.clone(), server_config.port);
    log::info!(
        "Listening on {}:{}, images api at {}",
        bind_address.0,
        bind_address.1,
        server_config.api_base_url
    );

    HttpServer::new(move || {
        let message_store = CookieMessageStore::builder(secret_key.clone()).build();
        let message_framework = FlashMessagesFramework::builder(message_store).build();

        App::new()
            .wrap(message_framework)
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .wrap(Logger::default())
            .app_data(api.clone())
            .app_data(cache.clone())
            .app_data(uploads.clone())
            .app_data(
                MultipartFormConfig::default().error_handler(routes::main::upload_error_handler),
            )
            .service(Files::new("/upload", &upload_path))
            .service(routes::main::index)
            .service(routes::main::upload_image)
            .service(routes::main::create_image)
    })
    .bind(bind_address)?
    .run()
    .await
}
