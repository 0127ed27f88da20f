use std::{fs::OpenOptions, sync::Arc};

use actix_web::{web, App, HttpServer};
use sea_orm::Database;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::{auth::Authority, notify::{LogNotifier, Notifier}};

mod config;
mod consts;
mod utils;
mod error;

mod period;
mod settlement;
mod ledger;
mod receipt;
mod notify;
mod service;

mod entity;
mod auth;
mod pages;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("trace.log")?;

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_line_number(true)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(filter::LevelFilter::from_level(Level::TRACE))
        );

    tracing::subscriber::set_global_default(subscriber).expect("Unable to install the trace subscriber");

    let config::Config {
        host_address,
        database_opt,
        jwt_key,
        payroll,
    } = config::load();

    info!(half_month_salary = payroll.half_month_salary, "Payroll configured");

    let database = web::Data::new(Database::connect(database_opt).await.expect("Unable to connect to database"));
    let authority = web::Data::new(Authority::new(jwt_key.as_bytes()));
    let payroll = web::Data::new(payroll);
    let notifier: web::Data<dyn Notifier> = web::Data::from(Arc::new(LogNotifier) as Arc<dyn Notifier>);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(database.clone())
            .app_data(authority.clone())
            .app_data(payroll.clone())
            .app_data(notifier.clone())
            .wrap(TracingLogger::default())
            .configure(pages::config)
    });

    server
        .bind(host_address)?
        .run().await
}
