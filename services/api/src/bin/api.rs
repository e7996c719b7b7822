//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        ensure_indexes, FirebaseTokenVerifier, MongoLessonStore, MongoReportStore,
        MongoUserStore, StripeGateway,
    },
    config::{Config, ConfigError},
    error::ApiError,
    web::{
        admin::{
            admin_delete_lesson_handler, manage_lessons_handler, set_featured_handler,
            set_reviewed_handler,
        },
        dashboard::{admin_summary_handler, user_summary_handler},
        lessons::{
            comment_handler, create_lesson_handler, delete_lesson_handler, favorite_handler,
            favorites_handler, featured_lessons_handler, get_lesson_handler, like_handler,
            list_lessons_handler, most_saved_lessons_handler, my_lessons_handler,
            remove_favorite_handler, update_lesson_handler, view_handler,
        },
        payments::{create_checkout_session_handler, payment_success_handler},
        reports::{
            delete_reported_lesson_handler, file_report_handler, ignore_reports_handler,
            lesson_reports_handler, moderation_queue_handler,
        },
        require_admin, require_auth,
        state::AppState,
        users::{
            delete_user_handler, list_users_handler, my_role_handler, promote_user_handler,
            top_contributors_handler, upsert_user_handler,
        },
        ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use mongodb::bson::doc;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Database ---
    info!("Connecting to MongoDB...");
    let client = mongodb::Client::with_uri_str(&config.mongodb_uri).await?;
    let db = client.database(&config.database_name);
    db.run_command(doc! { "ping": 1 }, None).await?;
    info!("Connected to database '{}'", config.database_name);
    ensure_indexes(&db).await?;

    // --- 3. Initialize Service Adapters ---
    let users = Arc::new(MongoUserStore::new(&db));
    let lessons = Arc::new(MongoLessonStore::new(&db));
    let reports = Arc::new(MongoReportStore::new(&db));
    let verifier = Arc::new(FirebaseTokenVerifier::new(config.identity_api_key.clone()));
    let payments = Arc::new(StripeGateway::new(
        config.stripe_secret_key.clone(),
        config.client_origin.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        users,
        lessons,
        reports,
        verifier,
        payments,
        config: config.clone(),
    });

    let mut origins = Vec::with_capacity(config.cors_origins.len());
    for origin in &config.cors_origins {
        let parsed = origin.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGINS".to_string(), e.to_string())
        })?;
        origins.push(parsed);
    }
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(|| async { "Hello from Server.." }))
        .route("/user", post(upsert_user_handler))
        .route("/lessons", get(list_lessons_handler).post(create_lesson_handler))
        .route("/lessons/featured", get(featured_lessons_handler))
        .route("/lessons/most-saved", get(most_saved_lessons_handler))
        .route("/lessons/{id}/view", post(view_handler))
        .route("/lessonsReports", post(file_report_handler))
        .route("/users/top-contributors", get(top_contributors_handler))
        .route("/create-checkout-session", post(create_checkout_session_handler))
        .route("/payment-success", post(payment_success_handler));

    // Signed-in routes (bearer token required)
    let bearer_routes = Router::new()
        .route("/user/role", get(my_role_handler))
        .route("/lessons/my-lessons", get(my_lessons_handler))
        .route(
            "/lessons/{id}",
            get(get_lesson_handler)
                .patch(update_lesson_handler)
                .delete(delete_lesson_handler),
        )
        .route("/lessons/{id}/like", post(like_handler))
        .route("/lessons/{id}/favorite", post(favorite_handler))
        .route("/lessons/{id}/comments", post(comment_handler))
        .route("/favorites", get(favorites_handler))
        .route("/favorites/remove", post(remove_favorite_handler))
        .route("/dashboard/user-summary", get(user_summary_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Admin routes. The auth layer is added last so it runs first and the
    // role check always sees an identity.
    let admin_routes = Router::new()
        .route("/manageUsers", get(list_users_handler))
        .route("/manageUsers/promote/{id}", patch(promote_user_handler))
        .route("/manageUsers/{id}", delete(delete_user_handler))
        .route("/reported-lessons", get(moderation_queue_handler))
        .route(
            "/reported-lessons/{id}",
            get(lesson_reports_handler).delete(delete_reported_lesson_handler),
        )
        .route("/reported-lessons/{id}/ignore", patch(ignore_reports_handler))
        .route("/admin/manage-lessons", get(manage_lessons_handler))
        .route("/admin/lessons/{id}/featured", patch(set_featured_handler))
        .route("/admin/lessons/{id}/reviewed", patch(set_reviewed_handler))
        .route("/admin/lessons/{id}", delete(admin_delete_lesson_handler))
        .route("/dashboard/admin-summary", get(admin_summary_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(bearer_routes)
        .merge(admin_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
