use crate::api_error;
use crate::model::{DeleteOutcome, Queue};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{header, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use log::debug;
use url::Url;

/// Name of the virtual host every broker has.
pub const DEFAULT_VHOST: &str = "/";

// The only character the client escapes in resource paths.
pub(crate) const ENCODED_DEFAULT_VHOST: &str = "%2F";

const IN_USE_MARKER: &str = "in use";

/// Authenticated client of the management HTTP API. The underlying connection pool is shared by
/// all the requests of the client.
pub struct ManagementClient {
    base: Url,
    authorization: String,
    http: Client<HttpConnector, Empty<Bytes>>,
}

impl ManagementClient {
    /// Create a client for the management API listening on `url`, e.g. `http://localhost:15672`.
    /// Requests are authenticated with basic auth.
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self> {
        let mut base = Url::parse(url).with_context(|| format!("Invalid management url {url:?}"))?;

        if base.scheme() != "http" {
            return Err(anyhow!("Unsupported scheme in management url {}", base));
        }

        // Resource paths are appended to the base path.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let credentials = general_purpose::STANDARD.encode(format!("{username}:{password}"));

        Ok(ManagementClient {
            base,
            authorization: format!("Basic {credentials}"),
            http: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// List the queues of all the virtual hosts in the order the broker returns them.
    pub async fn list_queues(&self) -> Result<Vec<Queue>> {
        let url = self.resource("api/queues/".to_string())?;
        let (status, body) = self.call(Method::GET, &url).await?;

        if !status.is_success() {
            return api_error!(Method::GET, url, status.as_u16(), String::from_utf8_lossy(&body));
        }

        let queues = serde_json::from_slice(&body).with_context(|| format!("Cannot decode queue list of {url}"))?;

        Ok(queues)
    }

    /// The resource url of the queue with the `if-unused` condition.
    ///
    /// The default virtual host is percent-encoded, anything else in the vhost or in the queue
    /// name goes to the path as it is, dot segments included. Characters not allowed in a uri
    /// make this an error.
    pub fn queue_url(&self, queue: &Queue) -> Result<Uri> {
        let vhost = if queue.vhost == DEFAULT_VHOST {
            ENCODED_DEFAULT_VHOST
        } else {
            queue.vhost.as_str()
        };

        self.resource(format!("api/queues/{}/{}?if-unused=true", vhost, queue.name))
    }

    // Url::join would normalise dot segments, Uri keeps the path as it is.
    fn resource(&self, path: String) -> Result<Uri> {
        let target = format!("{}{}", self.base, path);

        target
            .parse::<Uri>()
            .with_context(|| format!("Invalid resource url {target:?}"))
    }

    /// Delete the queue unless it has consumers.
    ///
    /// 204 means deleted, a response body mentioning `in use` means the broker kept the queue.
    /// Everything else is returned as an `ApiError`.
    pub async fn delete_queue_if_unused(&self, queue: &Queue) -> Result<DeleteOutcome> {
        let url = self.queue_url(queue)?;
        let (status, body) = self.call(Method::DELETE, &url).await?;

        if status == StatusCode::NO_CONTENT {
            return Ok(DeleteOutcome::Deleted);
        }

        let body = String::from_utf8_lossy(&body);

        if body.contains(IN_USE_MARKER) {
            return Ok(DeleteOutcome::InUse);
        }

        api_error!(Method::DELETE, url, status.as_u16(), body)
    }

    async fn call(&self, method: Method, url: &Uri) -> Result<(StatusCode, Bytes)> {
        debug!("{} {}", method, url);

        let req = Request::builder()
            .method(method.clone())
            .uri(url.clone())
            .header(header::AUTHORIZATION, &self.authorization)
            .body(Empty::new())?;

        let resp = self
            .http
            .request(req)
            .await
            .with_context(|| format!("{method} {url}"))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .with_context(|| format!("{method} {url}"))?
            .to_bytes();

        debug!("Response {} with {} bytes", status, body.len());

        Ok((status, body))
    }
}
