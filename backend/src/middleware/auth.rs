//! Authentication middleware
//!
//! JWT bearer validation. Token issuance (login/OTP) is handled by the
//! separate auth service; this layer only verifies tokens and extracts the
//! owner identity that scopes every ledger operation.

use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// Authenticated shop owner extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthOwner {
    pub owner_id: uuid::Uuid,
}

/// Authentication middleware that validates JWT tokens
/// Note: the JWT secret is read from the environment so the middleware can
/// run without access to the application state.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let jwt_secret = std::env::var("RBO__JWT__SECRET")
        .or_else(|_| std::env::var("RBO_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let owner_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid owner ID in token"),
    };

    request.extensions_mut().insert(AuthOwner { owner_id });

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}

/// Extractor for the authenticated owner
/// Use this in handlers to get the current owner
#[derive(Clone, Debug)]
pub struct CurrentOwner(pub AuthOwner);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthOwner>()
            .cloned()
            .map(CurrentOwner)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
