//! Correlation-id middleware.
//!
//! Every request runs inside an `http_request` span carrying a correlation
//! id, so reservation and settlement logs emitted deeper in the stack can be
//! tied back to the request that caused them.
//!
//! 1. **Extract** the id from `X-Correlation-ID` (or generate a UUID v4)
//! 2. **Store** it in request extensions as [`CorrelationId`]
//! 3. **Run** the handler inside a span with the id attached
//! 4. **Echo** the id in the response `X-Correlation-ID` header

use crate::extractors::CorrelationId;
use axum::{extract::Request, http::HeaderValue, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that adds correlation ID tracking to all requests.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use boxoffice_web::middleware::correlation_id_layer;
///
/// let app = Router::new()
///     .route("/ticket_reservations", post(create_reservation))
///     .layer(correlation_id_layer());
/// ```
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

/// Parse the inbound header, falling back to a fresh id.
fn inbound_correlation_id(req: &Request) -> CorrelationId {
    let id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    CorrelationId(id)
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = inbound_correlation_id(&req);
        req.extensions_mut().insert(correlation_id);

        // Path only; query strings may carry pagination noise.
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id.0,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;
            if let Ok(value) = HeaderValue::from_str(&correlation_id.0.to_string()) {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

/// Read the correlation id stored by [`correlation_id_layer`].
pub trait CorrelationIdExt {
    /// `None` if the middleware is not installed.
    fn correlation_id(&self) -> Option<CorrelationId>;
}

impl<B> CorrelationIdExt for http::Request<B> {
    fn correlation_id(&self) -> Option<CorrelationId> {
        self.extensions().get::<CorrelationId>().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route(
                "/echo",
                get(|req: Request| async move {
                    req.correlation_id()
                        .map_or_else(|| "missing".to_string(), |id| id.0.to_string())
                }),
            )
            .layer(correlation_id_layer())
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn generates_id_when_header_missing() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation id header should be present");
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn preserves_inbound_id_for_handlers_and_response() {
        let inbound = Uuid::new_v4();
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(CORRELATION_ID_HEADER, inbound.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(CORRELATION_ID_HEADER).unwrap(),
            inbound.to_string().as_str()
        );
        assert_eq!(body_text(response).await, inbound.to_string());
    }

    #[tokio::test]
    async fn replaces_malformed_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(CORRELATION_ID_HEADER, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header = response.headers().get(CORRELATION_ID_HEADER).unwrap();
        assert_ne!(header, "not-a-uuid");
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }
}
