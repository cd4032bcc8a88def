// API server implementation
// Author: Gabriel Demetrios Lafis

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::data::{DatasetLoader, XlsxEncoder, DEFAULT_EXPORT_FILE_NAME};
use crate::storage::LoadCache;
use super::routes;

/// API server configuration
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            enable_cors: false,
        }
    }
}

/// State shared by every request: the source file, its cached loads and
/// the export settings
#[derive(Clone)]
pub struct AppState {
    pub source: PathBuf,
    pub loader: DatasetLoader,
    pub cache: Arc<LoadCache>,
    pub encoder: XlsxEncoder,
    pub file_name: String,
}

impl AppState {
    /// State with default loader and export settings
    pub fn new<P: Into<PathBuf>>(source: P, cache: Arc<LoadCache>) -> Self {
        AppState {
            source: source.into(),
            loader: DatasetLoader::default(),
            cache,
            encoder: XlsxEncoder::default(),
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

/// API server
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a new API server
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Server { config, state }
    }

    /// Run the API server
    pub async fn run(&self) -> std::io::Result<()> {
        let state = web::Data::new(self.state.clone());
        let enable_cors = self.config.enable_cors;

        info!(
            "Starting server at http://{}:{} for '{}'",
            self.config.host,
            self.config.port,
            self.state.source.display()
        );

        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .expose_headers(vec!["content-disposition"])
                    .max_age(3600)
            } else {
                Cors::default()
            };

            App::new()
                .app_data(state.clone())
                .wrap(cors)
                .configure(routes::configure)
        })
        .workers(self.config.workers)
        .bind((self.config.host.as_str(), self.config.port))?
        .run()
        .await
    }
}
