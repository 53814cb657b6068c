use actix_web::{web, App, HttpServer};
use backend::config::Config;
use backend::file_store::{TempFileStore, TEMP_FILE_TTL};
use backend::mappings_store::MappingStore;
use backend::services;
use env_logger::Env;
use log::info;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::from_env();

    let mapping_store = MappingStore::open(config.mappings_file())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let mapping_store = web::Data::new(mapping_store);

    let file_store = Arc::new(TempFileStore::new(config.temp_dir(), TEMP_FILE_TTL));
    let sweeper = file_store.start_sweeper();
    let file_store: web::Data<TempFileStore> = web::Data::from(file_store);

    info!("Server running at http://{}:{}", config.host, config.port);

    let result = HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(file_store.clone())
            .app_data(mapping_store.clone())
            .service(services::uploads::configure_routes())
            .service(services::mappings::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    sweeper.abort();
    result
}
