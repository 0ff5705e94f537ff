use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware::Logger, web};
use dotenv::dotenv;
use env_logger::Env;
use qrstudio::config::Config;
use qrstudio::routes::init_routes;
use qrstudio::services::scanner::MAX_IMAGE_BYTES;
use qrstudio::state::app_state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Open the history backing (file, memory or MongoDB)
    let app_state = match AppState::from_config(&config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            eprintln!("Error opening the history store: {:#}", e);
            std::process::exit(1);
        }
    };

    let origins = config.cors_origins.clone();
    log::info!("Listening on {}:{}", config.bind_address, config.port);

    HttpServer::new(move || {
        // Create a logger with a custom format instead
        let logger = Logger::new("%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %D ms");
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec![http::header::ACCEPT, http::header::CONTENT_TYPE])
            .expose_headers(vec![http::header::CONTENT_DISPOSITION])
            .max_age(3600);
        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(app_state.clone())
            // Room for a 5MB image plus JSON overhead
            .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES + 1024 * 1024))
            .app_data(web::JsonConfig::default().limit(MAX_IMAGE_BYTES * 2))
            .configure(init_routes)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
