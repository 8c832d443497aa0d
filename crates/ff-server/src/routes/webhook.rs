// SPDX-License-Identifier: MIT

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use ff_webhook::Delivery;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

const EVENT_TYPE_HEADER: &str = "x-github-event";
const DELIVERY_ID_HEADER: &str = "x-github-delivery";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Serialize)]
pub struct ReceivedResponse {
    pub status: &'static str,
    pub event_id: String,
    pub event_type: String,
    pub queued: bool,
}

pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: axum::body::Bytes) -> ApiResult<Json<ReceivedResponse>> {
    let delivery = Delivery {
        event_type_header: header_str(&headers, EVENT_TYPE_HEADER),
        delivery_id: header_str(&headers, DELIVERY_ID_HEADER),
        signature_header: headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string),
        raw_body: body.to_vec(),
    };

    let outcome = state.webhook.handle_delivery(&state.clock, delivery).await?;
    Ok(Json(ReceivedResponse {
        status: "received",
        event_id: outcome.event_id.to_string(),
        event_type: outcome.event_type,
        // The delivery was accepted and persisted before any downstream
        // dispatch was even attempted — `queued` reflects that acceptance,
        // not whether this particular delivery happened to trigger a build.
        queued: true,
    }))
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string()
}
