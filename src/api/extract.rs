use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde_json::{json, Value};

use crate::api::error::HandlerErr;

/// JSON request body. Unreadable bodies and wrong content types surface as
/// `bad_params` like any other malformed input.
pub struct JsonParams(pub Value);

impl<S> FromRequest<S> for JsonParams
where
    S: Send + Sync,
{
    type Rejection = HandlerErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                HandlerErr::bad_params(e.body_text())
                    .with_details(json!({ "status": e.status().as_u16() }))
            })?;
        Ok(Self(value))
    }
}
