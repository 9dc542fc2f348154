use axum::{Router, middleware};

use crate::state::SharedState;

pub mod auth;
pub mod bookings;
pub mod docs;
pub mod health;
pub mod invitations;
pub mod matches;
pub mod notifications;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// Spectator reads, health and docs are public; everything else requires the
/// gateway identity header.
pub fn router(state: SharedState) -> Router<()> {
    let public_router = health::router().merge(matches::public_router());

    let protected_router = matches::protected_router()
        .merge(notifications::router())
        .merge(invitations::router())
        .merge(bookings::router())
        .route_layer(middleware::from_fn(auth::require_user));

    let docs_router = docs::router(state.clone());

    public_router
        .merge(protected_router)
        .merge(docs_router)
        .with_state(state)
}
