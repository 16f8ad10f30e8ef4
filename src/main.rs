use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::{error, info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use naymer::auth::JwtKeys;
use naymer::openapi::ApiDoc;
use naymer::{config, AppState, Backend, Settings};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    info!(frontend = %settings.frontend_url, reputation = ?settings.reputation, "bootstrapping naymer server");

    let backend = Backend::init(&settings.store).await?;
    let state = AppState { repo: backend.repo(), reputation: settings.reputation };
    let keys = JwtKeys::from_secret(settings.jwt_secret.as_bytes());
    let openapi = ApiDoc::openapi();
    let frontend_url = settings.frontend_url.clone();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            // local dev frontend
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:5173")
            .allowed_origin(&frontend_url)
            .allow_any_header()
            .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(keys.clone()))
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(settings.bind_addr.as_str())?;

    info!(addr = %settings.bind_addr, "listening");
    server.run().await?;

    backend.shutdown().await?;
    Ok(())
}
