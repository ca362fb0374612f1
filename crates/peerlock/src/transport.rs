//! Point-to-point RPC transport

use async_trait::async_trait;
use std::time::Duration;

use peerlock_core::{AccessReply, AccessRequest, AccessStatus, Error, GrantNotice, NodeIdentity, Result};

/// Sends the protocol's messages to one peer at a time
///
/// A seam for the coordinator: production uses HTTP, tests substitute mocks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask a peer for permission to use the resource
    async fn request_access(
        &self,
        peer: &NodeIdentity,
        request: &AccessRequest,
    ) -> Result<AccessStatus>;

    /// Tell a peer that the noticed node now holds the resource
    async fn notify_granted(&self, peer: &NodeIdentity, notice: &GrantNotice) -> Result<()>;
}

/// HTTP JSON transport over point-to-point requests
///
/// Every call is bounded by the round timeout; failures surface as
/// [`Error::PeerUnreachable`] and are folded into the round decision by the
/// coordinator.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose calls time out after `round_timeout`
    pub fn new(round_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(round_timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    fn unreachable(peer: &NodeIdentity, error: &reqwest::Error) -> Error {
        Error::PeerUnreachable {
            peer: peer.id,
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request_access(
        &self,
        peer: &NodeIdentity,
        request: &AccessRequest,
    ) -> Result<AccessStatus> {
        let reply: AccessReply = self
            .client
            .post(format!("http://{}/access", peer.address))
            .json(request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Self::unreachable(peer, &e))?
            .json()
            .await
            .map_err(|e| Self::unreachable(peer, &e))?;
        Ok(reply.status)
    }

    async fn notify_granted(&self, peer: &NodeIdentity, notice: &GrantNotice) -> Result<()> {
        self.client
            .post(format!("http://{}/granted", peer.address))
            .json(notice)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Self::unreachable(peer, &e))?;
        Ok(())
    }
}
