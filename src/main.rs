use axum::{
    Router,
    routing::{get, post},
};
use dotenv::dotenv;
use mongodb::{Client, Database, options::ClientOptions};
use std::{env::var, net::SocketAddr, sync::OnceLock};
use tracing_subscriber::EnvFilter;

mod apex;
mod catalog;
mod cycle;
mod effectiveness;
mod profiles;
mod recommendations;
mod routines;
mod weather;

use apex::endpoints::*;
use cycle::endpoints::*;
use effectiveness::endpoints::*;
use recommendations::endpoints::*;
use routines::endpoints::*;
use weather::endpoints::*;

pub(crate) static DB: OnceLock<Database> = OnceLock::new();

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mongodb_uri = var("MONGODB_URI").unwrap();
    let client_options = ClientOptions::parse(mongodb_uri).await.unwrap();
    let client = Client::with_options(client_options).expect("Failed to create Mongo client");

    DB.set(client.database("dermaglow_main")).unwrap();

    let domain = var("DOMAIN").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("Failed to parse PORT");

    let addr = SocketAddr::from((
        domain
            .parse::<std::net::IpAddr>()
            .expect("Failed to parse DOMAIN"),
        port,
    ));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    let app = Router::new()
        .route("/feedback", post(submit_feedback_endpoint))
        .route(
            "/admin/effectiveness/recompute",
            post(recompute_effectiveness_endpoint),
        )
        .route(
            "/users/{user_id}/recommendations",
            get(get_recommendations_endpoint),
        )
        .route("/users/{user_id}/insights", get(get_insights_endpoint))
        .route("/users/{user_id}/cycle/phase", get(get_cycle_phase_endpoint))
        .route(
            "/users/{user_id}/routine/adjustments",
            get(get_routine_adjustments_endpoint),
        )
        .route("/weather/adjustments", get(get_weather_adjustments_endpoint))
        .route("/", get(root_endpoint));

    axum::serve(listener, app).await.unwrap();
}
