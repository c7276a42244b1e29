use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AuthError, AppState};

/// Resolves the caller's session. Decoded claims land in request extensions
/// for the `AuthClaims` extractor; requests to protected routes without a
/// decodable token are rejected here.
pub struct SessionMiddleware;

impl<S> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let path = req.path().to_owned();
            let method = req.method().as_str().to_owned();

            let state = req.app_data::<web::Data<AppState>>()
                .ok_or_else(|| {
                    tracing::error!("AppState missing in session middleware");
                    AuthError::MissingTokenService
                })?;

            // Public routes still get claims attached when a token rides
            // along, so handlers can personalize read-only responses.
            let claims = extract_token(&req)
                .and_then(|token| {
                    state.auth_handler.token_service
                        .decode_session_token(&token)
                        .ok()
                })
                .map(|decoded| decoded.claims);

            if is_public_route(&path, &method) {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                return service.call(req).await;
            }

            match claims {
                Some(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                None => {
                    tracing::warn!(path = %path, "Missing or invalid session token");
                    Ok(custom_error_response(req, HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "Unauthorized"
                    }))))
                }
            }
        })
    }
}

fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return true;
    }

    if method == "GET" {
        if matches!(path, "/" | "/health" | "/api/public/reviews" | "/api/search") {
            return true;
        }
        if path.starts_with("/api/images/") {
            return true;
        }
        // Single-review reads are public; mutations on the same path are not
        if path.starts_with("/api/reviews/") {
            return true;
        }
    }

    matches!(
        (path, method),
        ("/auth/register", "POST") | ("/auth/login", "POST") | ("/auth/refresh-token", "POST")
    )
}

pub(crate) fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

pub(crate) fn custom_error_response(req: ServiceRequest, res: HttpResponse) -> ServiceResponse<BoxBody> {
    req.into_response(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_reads_bypass_the_session_gate() {
        assert!(is_public_route("/api/public/reviews", "GET"));
        assert!(is_public_route("/api/search", "GET"));
        assert!(is_public_route("/api/images/some-id", "GET"));
        assert!(is_public_route("/api/reviews/some-id", "GET"));
        assert!(is_public_route("/health", "GET"));
    }

    #[test]
    fn mutations_and_admin_routes_are_gated() {
        assert!(!is_public_route("/api/reviews", "POST"));
        assert!(!is_public_route("/api/reviews/some-id", "PUT"));
        assert!(!is_public_route("/api/reviews/some-id", "DELETE"));
        assert!(!is_public_route("/api/admin/stats", "GET"));
        assert!(!is_public_route("/api/csrf", "GET"));
        assert!(!is_public_route("/api/upload", "POST"));
    }

    #[test]
    fn auth_endpoints_are_open() {
        assert!(is_public_route("/auth/login", "POST"));
        assert!(is_public_route("/auth/register", "POST"));
        assert!(is_public_route("/auth/refresh-token", "POST"));
        assert!(!is_public_route("/auth/login", "GET"));
    }
}
