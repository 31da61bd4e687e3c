use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use critique::db::init_db;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();
    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;

    HttpServer::new(|| {
        App::new()
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(critique::web::configure)
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
fn init_our_mods() {
    critique::app_config::init();

    let mut config = critique::app_config::APP_CONFIG.write().unwrap();
    if config.security.secret_key.is_empty() {
        let random_string: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        log::warn!(
            "security.secret_key was empty, generated an ephemeral one. \
             Forms signed before a restart will stop validating after it; \
             set CRITIQUE_SECURITY_SECRET_KEY for a stable key."
        );
        config.security.secret_key = random_string;
    }
}
