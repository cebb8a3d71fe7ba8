use anyhow::Result;
use reqwest::{Body, Client, Method, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use super::config::{WebDAVConfig, WebDAVCredential};
use super::url_management::WebDAVUrlManager;
use crate::errors::WebDavTransportError;

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
    <D:prop>
        <D:getlastmodified/>
        <D:getcontentlength/>
        <D:resourcetype/>
    </D:prop>
</D:propfind>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropfindDepth {
    Zero,
    One,
}

impl PropfindDepth {
    fn header_value(self) -> &'static str {
        match self {
            PropfindDepth::Zero => "0",
            PropfindDepth::One => "1",
        }
    }
}

#[derive(Debug, Clone)]
struct DavMethods {
    propfind: Method,
    mkcol: Method,
    move_: Method,
}

impl DavMethods {
    fn new() -> Result<Self> {
        Ok(Self {
            propfind: Method::from_bytes(b"PROPFIND")?,
            mkcol: Method::from_bytes(b"MKCOL")?,
            move_: Method::from_bytes(b"MOVE")?,
        })
    }
}

/// Thin verb-level client. Every non-2xx status comes back as
/// `WebDavTransportError::Status`; no request is retried.
#[derive(Debug, Clone)]
pub struct WebDAVConnection {
    client: Client,
    url_manager: WebDAVUrlManager,
    credential: WebDAVCredential,
    methods: DavMethods,
}

impl WebDAVConnection {
    pub fn new(config: &WebDAVConfig) -> Result<Self> {
        // Validate configuration first
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Self::with_client(client, &config.webdav_url(), config.credential())
    }

    /// Builds a connection around a caller-owned `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str, credential: WebDAVCredential) -> Result<Self> {
        Ok(Self {
            client,
            url_manager: WebDAVUrlManager::new(base_url)?,
            credential,
            methods: DavMethods::new()?,
        })
    }

    pub fn url_manager(&self) -> &WebDAVUrlManager {
        &self.url_manager
    }

    /// Returns the final response URL (after redirects) and the multistatus body.
    pub async fn propfind(
        &self,
        url: &Url,
        depth: PropfindDepth,
    ) -> Result<(Url, String), WebDavTransportError> {
        let response = self
            .send(self.methods.propfind.clone(), url, |request| {
                request
                    .header("Depth", depth.header_value())
                    .header("Content-Type", "application/xml; charset=utf-8")
                    .body(PROPFIND_BODY)
            })
            .await?;
        let response_url = response.url().clone();
        let body = response.text().await?;
        Ok((response_url, body))
    }

    pub async fn get(&self, url: &Url) -> Result<Response, WebDavTransportError> {
        self.send(Method::GET, url, |request| request).await
    }

    /// Streams `body` as the new content of `url`. `content_length` is sent up front
    /// so servers do not have to accept chunked uploads.
    pub async fn put(
        &self,
        url: &Url,
        body: Body,
        content_length: u64,
    ) -> Result<(), WebDavTransportError> {
        self.send(Method::PUT, url, |request| {
            request
                .header("Content-Type", "application/octet-stream")
                .header("Content-Length", content_length)
                .body(body)
        })
        .await?;
        Ok(())
    }

    pub async fn mkcol(&self, url: &Url) -> Result<(), WebDavTransportError> {
        self.send(self.methods.mkcol.clone(), url, |request| request)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, url: &Url) -> Result<(), WebDavTransportError> {
        self.send(Method::DELETE, url, |request| request).await?;
        Ok(())
    }

    /// MOVE with `Overwrite: F`, so an occupied destination fails with 412.
    pub async fn move_resource(
        &self,
        source: &Url,
        destination: &Url,
    ) -> Result<(), WebDavTransportError> {
        self.send(self.methods.move_.clone(), source, |request| {
            request
                .header("Destination", destination.as_str())
                .header("Overwrite", "F")
        })
        .await?;
        Ok(())
    }

    pub async fn options(&self, url: &Url) -> Result<Response, WebDavTransportError> {
        self.send(Method::OPTIONS, url, |request| request).await
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, WebDavTransportError> {
        debug!("{} {}", method, url);
        let request = self.authorize(self.client.request(method.clone(), url.clone()));
        let response = build(request).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            debug!("{} {} failed with status {}", method, url, status);
            Err(WebDavTransportError::Status(status.as_u16()))
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            WebDAVCredential::Anonymous => request,
            WebDAVCredential::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            WebDAVCredential::Bearer(token) => request.bearer_auth(token),
        }
    }
}
