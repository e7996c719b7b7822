pub mod admin;
pub mod dashboard;
pub mod lessons;
pub mod middleware;
pub mod payments;
pub mod policy;
pub mod reports;
pub mod state;
pub mod users;

#[cfg(test)]
pub(crate) mod testutil;

use utoipa::OpenApi;

// Re-export the auth layers for the binary that builds the router.
pub use middleware::{require_admin, require_auth};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        users::upsert_user_handler,
        lessons::list_lessons_handler,
        lessons::view_handler,
        payments::create_checkout_session_handler,
        payments::payment_success_handler,
    ),
    components(
        schemas(
            payments::CheckoutRequest,
            payments::CheckoutResponse,
            payments::PaymentSuccessRequest
        )
    ),
    tags(
        (name = "LessonFlow API", description = "API endpoints for sharing and discovering life lessons.")
    )
)]
pub struct ApiDoc;
