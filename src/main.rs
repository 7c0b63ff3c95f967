use std::io;

use actix_web::{
    middleware::{from_fn, Logger},
    App, HttpServer,
};
use dotenvy::dotenv;
use mongodb::Client;
use tracing::{info, warn};
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

use dealer_orders::{
    auth::{gate::gate, seed_admin, AuthService},
    config::Config,
    repositories::{
        in_memory::{InMemoryOrderRepository, InMemoryUserRepository},
        mongo::{MongoOrderRepository, MongoUserRepository},
    },
    routes,
    state::AppState,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cfg = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let auth = AuthService::from_config(&cfg);

    let state = match &cfg.mongodb_uri {
        Some(uri) => {
            let client = Client::with_uri_str(uri).await.map_err(io::Error::other)?;
            let db = client.database(&cfg.mongodb_db);
            let users = MongoUserRepository::new(&db);
            users.ensure_indexes().await.map_err(io::Error::other)?;
            info!(db = %cfg.mongodb_db, "using MongoDB store");
            AppState::new(MongoOrderRepository::new(&db), users, auth)
        }
        None => {
            warn!("MONGODB_URI not set, data is kept in memory");
            AppState::new(
                InMemoryOrderRepository::default(),
                InMemoryUserRepository::default(),
                auth,
            )
        }
    };

    if let Some(seed) = &cfg.admin {
        seed_admin(state.users.as_ref(), &state.auth, seed)
            .await
            .map_err(io::Error::other)?;
    }

    info!(addr = %cfg.server_addr, "starting server");
    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(gate))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::config)
    })
    .bind(&cfg.server_addr)?
    .run()
    .await
}
