mod api;
mod app;
mod auth;
mod dto;
mod error;
mod models;
mod repositories;
mod telemetry;
mod threading;
mod usecases;

#[tokio::main]
async fn main() {
    if let Err(err) = app::run().await {
        eprintln!("pet-feed failed: {err}");
        std::process::exit(1);
    }
}
