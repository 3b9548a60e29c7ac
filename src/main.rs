use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod aggregate;
mod api;
mod config;
mod db;
mod directory;
mod docs;
mod model;
mod notify;
mod punch;
mod routes;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::api::attendance::SharedNotifier;
use crate::directory::{BranchDirectory, EmployeeDirectory};
use crate::notify::LogDispatcher;
use crate::store::MySqlKeyedStore;
use crate::store::records::RecordStore;
use crate::utils::employee_filter;
use tracing::info;
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;
use crate::docs::ApiDoc;
use utoipa::OpenApi;

#[get("/")]
async fn index() -> impl Responder {
    "Punchclock up"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    // Warm the employee id filter so punches for unknown ids fail fast.
    let pool_for_filter_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = employee_filter::warmup_employee_filter(&pool_for_filter_warmup, 500).await
        {
            eprintln!("Failed to warmup employee filter: {:?}", e);
        }
    });

    let records = RecordStore::new(Arc::new(MySqlKeyedStore::new(pool.clone())));
    let employees = EmployeeDirectory::new(pool.clone());
    let branches = BranchDirectory::new(pool.clone());
    let notifier: SharedNotifier = Arc::new(LogDispatcher);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(records.clone()))
            .app_data(Data::new(employees.clone()))
            .app_data(Data::new(branches.clone()))
            .app_data(Data::new(notifier.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
