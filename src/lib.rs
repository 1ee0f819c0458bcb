pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// The complete HTTP surface, everything under `/api`.
pub fn app(state: AppState) -> Router {
    let public_dir = ServeDir::new(&state.config.server.public_dir);

    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        // Rendered QR codes and other static artifacts
        .nest_service("/public", public_dir);

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public::{auth, health};

    Router::new()
        .route("/health", get(health::get))
        // Registration with the level in the path
        .route("/register/:as", post(auth::register_post))
        .route("/register/:as/:email", post(auth::register_with_email_post))
        // Session acquisition
        .route("/login", post(auth::login_post))
        .route("/login/with-qr/:xid", put(auth::qr_login_put))
        .route("/token/refresh", post(auth::refresh_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{account, address, calendar, education, mark};

    Router::new()
        // Email verification
        .route("/code", get(account::code_get))
        .route("/code/send", post(account::code_send))
        .route("/code/verification/:code", post(account::code_verify))
        // Password
        .route("/password", post(account::password_post))
        .route("/password/history", get(account::password_history))
        // Profile
        .route("/profile", get(account::profile_get).put(account::profile_put))
        .route("/profile/active", put(account::profile_activate))
        .route("/generate-qr", post(account::qr_generate))
        // Address
        .route(
            "/address",
            get(address::get)
                .post(address::post)
                .put(address::put)
                .delete(address::delete),
        )
        // Education
        .route("/education", get(education::levels))
        .route("/education/:edu", get(education::subjects))
        .route(
            "/user/education",
            get(education::user_level)
                .post(education::assign)
                .put(education::replace),
        )
        .route("/user/subject", get(education::user_subjects))
        // Ratings
        .route("/user_mark", post(mark::post))
        .route("/user_mark/comment", get(mark::authored))
        .route("/user_mark/:user_id", get(mark::average))
        // Planning
        .route("/calendar", get(calendar::list).post(calendar::post))
        .route("/calendar/:calendar_id", axum::routing::delete(calendar::delete))
        .route(
            "/calendar/:calendar_id/actor",
            get(calendar::actor_list)
                .post(calendar::actor_post)
                .delete(calendar::actor_delete),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
