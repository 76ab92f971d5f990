use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use taskgate::auth::{InMemoryRevocationStore, RedisRevocationStore, RevocationStore, TokenService};
use taskgate::config::Config;
use taskgate::db::{self, PgTaskRepository, PgUserRepository};
use taskgate::routes::{self, health};
use taskgate::state::{AppState, Backends};

fn startup_error<E: std::fmt::Display>(context: &str, err: E) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    let (revocations, revocation_backend): (Arc<dyn RevocationStore>, &'static str) =
        match &config.redis_url {
            Some(url) => {
                let store = RedisRevocationStore::connect(url)
                    .await
                    .map_err(|e| startup_error("Failed to connect to Redis", e))?;
                log::info!("Token revocations are stored in Redis");
                (Arc::new(store), "redis")
            }
            None => {
                log::warn!(
                    "REDIS_URL not set: token revocations are kept in process memory and are lost on restart"
                );
                (Arc::new(InMemoryRevocationStore::new()), "memory")
            }
        };

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl, revocations);

    let state = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.database_max_connections)
                .await
                .map_err(|e| startup_error("Failed to connect to database", e))?;
            db::migrate(&pool)
                .await
                .map_err(|e| startup_error("Failed to run migrations", e))?;
            log::info!("Connected to PostgreSQL and applied migrations");

            AppState::new(
                Arc::new(PgUserRepository::new(pool.clone())),
                Arc::new(PgTaskRepository::new(pool)),
                tokens,
                config.bcrypt_cost,
            )
            .with_backends(Backends {
                storage: "postgres",
                revocation: revocation_backend,
            })
        }
        None => {
            log::warn!("DATABASE_URL not set: running on in-memory stores, nothing will be persisted");
            AppState::new(
                Arc::new(db::InMemoryUserRepository::new()),
                Arc::new(db::InMemoryTaskRepository::new()),
                tokens,
                config.bcrypt_cost,
            )
            .with_backends(Backends {
                storage: "memory",
                revocation: revocation_backend,
            })
        }
    };

    Ok(state)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    let state = web::Data::new(build_state(&config).await?);

    log::info!("Starting TaskGate server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
