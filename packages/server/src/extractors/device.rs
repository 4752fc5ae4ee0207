use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::services::DeviceHash;

pub const DEVICE_ID_HEADER: &str = "X-Device-Id";
pub const UPLOADER_NAME_HEADER: &str = "X-Uploader-Name";

/// Fingerprint of the calling device, from `X-Device-Id` or the peer address.
impl<S> FromRequestParts<S> for DeviceHash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client_supplied = parts
            .headers
            .get(DEVICE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim);

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(DeviceHash::fingerprint(client_supplied, peer.as_deref()))
    }
}

/// Display name sent alongside an upload, if any.
pub fn uploader_name(headers: &HeaderMap) -> Option<String> {
    headers
        .get(UPLOADER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
