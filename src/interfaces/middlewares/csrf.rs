use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpResponse,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    constants::{CSRF_COOKIE, CSRF_HEADER},
    interfaces::middlewares::auth::{custom_error_response, extract_token},
    AppState,
};

/// Double-submit check for state-changing requests: the token in the
/// `X-CSRF-Token` header must byte-match the one in the `csrf-token`
/// cookie, and a valid session must exist before either is looked at.
/// Failure modes are distinguished: no session is 401, token problems are
/// 403.
pub struct CsrfGuard;

impl<S> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CsrfGuardService {
            service: Rc::new(service),
        })
    }
}

pub struct CsrfGuardService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for CsrfGuardService<S>
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
            if is_safe_method(req.method()) || is_exempt(req.path()) {
                return service.call(req).await;
            }

            let state = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.clone(),
                None => {
                    tracing::error!("AppState missing in CSRF middleware");
                    return Ok(custom_error_response(req, HttpResponse::InternalServerError().json(
                        serde_json::json!({"error": "Internal server error"}),
                    )));
                }
            };

            // Session presence only; the claims themselves are resolved later
            let session_valid = extract_token(&req)
                .map(|token| state.auth_handler.token_service.decode_session_token(&token).is_ok())
                .unwrap_or(false);

            if !session_valid {
                return Ok(custom_error_response(req, HttpResponse::Unauthorized().json(
                    serde_json::json!({"error": "Unauthorized"}),
                )));
            }

            let header_token = req
                .headers()
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_owned());

            let Some(header_token) = header_token else {
                tracing::warn!("CSRF token missing from request headers");
                return Ok(custom_error_response(req, HttpResponse::Forbidden().json(
                    serde_json::json!({"error": "CSRF token missing"}),
                )));
            };

            let cookie_token = req.cookie(CSRF_COOKIE).map(|c| c.value().to_owned());

            let Some(cookie_token) = cookie_token else {
                tracing::warn!("CSRF token missing from cookies");
                return Ok(custom_error_response(req, HttpResponse::Forbidden().json(
                    serde_json::json!({"error": "CSRF token missing"}),
                )));
            };

            if header_token.as_bytes() != cookie_token.as_bytes() {
                tracing::warn!("CSRF token mismatch");
                return Ok(custom_error_response(req, HttpResponse::Forbidden().json(
                    serde_json::json!({"error": "Invalid CSRF token"}),
                )));
            }

            service.call(req).await
        })
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

// No CSRF token can exist before a session does
fn is_exempt(path: &str) -> bool {
    path.starts_with("/auth/")
}
