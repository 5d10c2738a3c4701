//! Panic containment stage.
//!
//! A panic raised while producing a response is caught here, logged at error
//! level within the current request span and turned into a generic JSON 500.
//! The connection task keeps serving.

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use std::any::Any;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::http::error::ApiError;

/// Layer installing [`PanicResponder`].
pub fn layer() -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PanicResponder;

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        tracing::error!(panic = %panic_message(err.as_ref()), "Panic recovered");
        ApiError::internal().into_response()
    }
}

/// Best-effort rendering of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
