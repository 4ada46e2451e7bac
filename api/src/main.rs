use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod assistant;
mod auth;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

use assistant::provider::GroqClient;
use assistant::week;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plato Coaching API",
        version = "0.1.0",
        description = "Patient/nutritionist coaching backend: moderated plan assistant, \
                       locale, feedback and engagement telemetry."
    ),
    paths(
        routes::health::health_check,
        routes::assistant::plan_assistant,
        routes::locale::set_locale,
        routes::feedback::submit_nps,
        routes::telemetry::record_event,
    ),
    components(schemas(
        routes::health::HealthResponse,
        plato_core::error::ApiError,
        plato_core::profile::Profile,
        plato_core::profile::Locale,
        plato_core::profile::Role,
        plato_core::plan::PlanRecord,
        plato_core::plan::PlanStatus,
        plato_core::lessons::Lesson,
        routes::OkResponse,
        routes::assistant::AssistantRequestBody,
        routes::assistant::AssistantAnswer,
        routes::locale::LocaleRequest,
        routes::feedback::NpsRequest,
        routes::feedback::NpsResponse,
        routes::telemetry::TelemetryRequest,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plato_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Database connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Completion provider is optional: without credentials the assistant
    // endpoint answers 501 and everything else keeps working.
    let groq = GroqClient::from_env().map(Arc::new);
    if groq.is_none() {
        tracing::warn!("GROQ_API_KEY not set, plan assistant disabled");
    }

    let app_state = state::AppState {
        db: pool,
        assistant: groq,
        clinic_tz: week::clinic_tz_from_env(),
    };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Router with per-endpoint rate limiting
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::assistant::router().layer(middleware::rate_limit::assistant_layer()))
        .merge(routes::locale::router().layer(middleware::rate_limit::forms_layer()))
        .merge(routes::feedback::router().layer(middleware::rate_limit::forms_layer()))
        .merge(routes::telemetry::router().layer(middleware::rate_limit::telemetry_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Plato API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
