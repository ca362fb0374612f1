//! Inbound HTTP endpoints
//!
//! Each peer serves two routes: `/access` answers admission requests from
//! its own state alone, `/granted` takes hand-off and informational grant
//! notices. Malformed bodies are rejected at this boundary and never touch
//! the state block.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::warn;

use peerlock_core::{AccessReply, AccessRequest, AccessStatus, GrantNotice};

use crate::node::Node;

/// Build the node's HTTP router
pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/access", post(access))
        .route("/granted", post(granted))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}

async fn access(
    State(node): State<Arc<Node>>,
    Json(request): Json<AccessRequest>,
) -> Result<Json<AccessReply>, StatusCode> {
    match node.handle_access(&request) {
        Ok(status) => Ok(Json(AccessReply::new(status))),
        Err(error) => {
            warn!(%error, "rejected access request");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

async fn granted(
    State(node): State<Arc<Node>>,
    Json(notice): Json<GrantNotice>,
) -> Json<AccessReply> {
    node.receive_grant(&notice);
    Json(AccessReply::new(AccessStatus::Ok))
}
