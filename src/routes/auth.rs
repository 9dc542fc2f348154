use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    identity::{CurrentUser, USER_ID_HEADER, USER_NAME_HEADER},
};

/// Attach the gateway-asserted caller to the request, rejecting anonymous calls.
pub async fn require_user(mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = current_user(&req).ok_or_else(|| {
        AppError::Unauthorized(format!("missing user header `{USER_ID_HEADER}`"))
    })?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn current_user(req: &Request<Body>) -> Option<CurrentUser> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    let id = header(USER_ID_HEADER)?;
    Some(CurrentUser::new(id, header(USER_NAME_HEADER)))
}
