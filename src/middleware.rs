use std::future::Future;
use std::net::IpAddr;

use hyper::header::HOST;
use hyper::Request;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::lock::{Error, Granule};

/// Derive a lock key identifying a request: same method, host, path and client
pub fn request_fingerprint<B>(request: &Request<B>, client_ip: Option<IpAddr>) -> String {
    let host = request
        .uri()
        .authority()
        .map(|authority| authority.host().to_string())
        .or_else(|| {
            request
                .headers()
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string)
        })
        .unwrap_or_default();
    let client_ip = client_ip.map(|ip| ip.to_string()).unwrap_or_default();

    let signature = [
        request.method().as_str(),
        host.as_str(),
        request.uri().path(),
        client_ip.as_str(),
    ]
    .join("|");

    let mut hasher = Sha256::new();
    hasher.update(signature.as_bytes());
    hex::encode(hasher.finalize().as_slice())
}

/// Serialize identical requests: `next` runs inside a critical section keyed
/// by the request fingerprint, with the default acquisition budget.
#[instrument(skip_all, fields(method = %request.method(), path = request.uri().path()))]
pub async fn synchronize_request<B, F, Fut, T>(
    granule: &Granule,
    request: Request<B>,
    client_ip: Option<IpAddr>,
    next: F,
) -> Result<T, Error>
where
    F: FnOnce(Request<B>) -> Fut,
    Fut: Future<Output = T>,
{
    let key = request_fingerprint(&request, client_ip);
    debug!("Synchronizing request on {key}");
    granule.granule(&key, move || next(request), None).await
}
