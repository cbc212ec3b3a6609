use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::{app::AppState, App};

use super::{midware, routes::routes, REQUEST_ID_HEADER};

/// The core async function returning a future that will serve this application.
///
/// Accepts an `App` holding the bound `TcpListener` and the `AppState`.
pub async fn serve(app: App) -> std::io::Result<()> {
    let App {
        app_state,
        listener,
    } = app;

    axum::serve(listener, build_router(app_state)).await
}

/// All routes wrapped in the middleware stack: request id, tracing and response mapping.
pub fn build_router(app_state: AppState) -> Router {
    let x_request_id: HeaderName = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new().merge(routes(app_state)).layer(
        ServiceBuilder::new()
            // Set UUID per request
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            .layer(build_trace_layer())
            // Responses travel the stack bottom up, the mapper has to run before the
            // request id gets propagated.
            .layer(middleware::map_response(midware::response_mapper))
            // Propagate UUID to response, keep it last so it processes the response first!
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// One `request` span per request carrying the request id, and a closing event whose
/// level follows the status class.
fn build_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    impl OnRequest<Body> + Clone,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(request_span)
        .on_request(|_req: &Request<Body>, _span: &Span| tracing::debug!("request received"))
        .on_response(|res: &Response<Body>, latency: Duration, _span: &Span| {
            let status = res.status();
            if status.is_server_error() {
                tracing::error!(%status, ?latency, "request failed");
            } else if status.is_client_error() {
                tracing::warn!(%status, ?latency, "request rejected");
            } else {
                tracing::info!(%status, ?latency, "request handled");
            }
        })
}

fn request_span(req: &Request<Body>) -> Span {
    // Set by `SetRequestIdLayer`, which sits above this layer.
    let req_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        req_id,
        method = %req.method(),
        path = req.uri().path(),
    )
}
