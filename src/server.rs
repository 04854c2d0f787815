//! The HTTP gateway: routes requests, drives the resolve/materialize/locate
//! pipeline, and renders the result as a file body or an HTML page.

pub mod html;
pub mod mime;
pub mod response;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use percent_encoding::percent_decode_str;
use rama::{
    Service,
    error::BoxError,
    http::{Body, Method, Request, Response, StatusCode},
};
use tracing::{error, info};

use crate::{
    artifact::{self, Artifact},
    config::Config,
    error::ClientError,
    pathspec::PathSpec,
    registry::RegistryClient,
    resolver,
    tarcache::CacheStore,
};

/// Main gateway service
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<RegistryClient>,
    cache: Arc<CacheStore>,
}

impl Gateway {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            registry: Arc::new(RegistryClient::new(&config.registry)?),
            cache: Arc::new(CacheStore::new(&config.cache)),
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    async fn handle(&self, req: &Request<Body>) -> Result<Response<Body>> {
        if req.method() != Method::GET {
            return response::text(StatusCode::METHOD_NOT_ALLOWED, "Only GET is supported\n");
        }

        let raw_path = req.uri().path();
        match raw_path {
            "/" => return response::html(StatusCode::OK, html::home_page()),
            // Browsers ask for this on every page; don't burn a registry
            // round-trip treating it as a package name.
            "/favicon.ico" => return response::text(StatusCode::NOT_FOUND, "no favicon\n"),
            _ => {}
        }

        let path = percent_decode_str(raw_path)
            .decode_utf8()
            .map_err(|_| ClientError::bad_request("request path is not valid UTF-8"))?;

        self.deliver(&path).await
    }

    /// The full pipeline for a package path: parse, fetch metadata,
    /// resolve versions, then either render a listing or materialize the
    /// designated version and serve the object out of it.
    async fn deliver(&self, path: &str) -> Result<Response<Body>> {
        let spec = PathSpec::parse(path)?;
        let doc = self.registry.fetch_metadata(&spec.package_name).await?;

        let resolved = resolver::resolve(&spec.version_spec, &doc);
        if resolved.versions.is_empty() {
            return response::html(StatusCode::BAD_REQUEST, html::all_versions_page(&doc, &spec));
        }
        if !resolved.designated {
            return response::html(
                StatusCode::OK,
                html::versions_page(&resolved.versions, &doc, &spec),
            );
        }

        let exact_version = &resolved.versions[0];
        let local_name = format!("{}-{}", spec.package_name, exact_version);
        let extracted_dir = self
            .cache
            .ensure_materialized(self.registry.as_ref(), &doc, exact_version, &local_name)
            .await?;

        let found =
            artifact::locate(spec.object_path.as_ref(), &extracted_dir, &spec.package_name).await?;
        match found {
            Artifact::Listing { entries } => {
                let object = spec
                    .object_path
                    .as_ref()
                    .map(|object| object.as_str())
                    .unwrap_or("/");
                response::html(
                    StatusCode::OK,
                    html::directory_page(&local_name, object, &entries),
                )
            }
            Artifact::EntryFile { relpath, bytes } | Artifact::File { relpath, bytes } => {
                response::file(bytes, mime::guess(&relpath))
            }
        }
    }
}

impl Service<Request<Body>> for Gateway {
    type Output = Response<Body>;
    type Error = BoxError;

    async fn serve(&self, req: Request<Body>) -> Result<Self::Output, Self::Error> {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let result = match self.handle(&req).await {
            Ok(resp) => Ok(resp),
            // Client faults become readable responses; everything else is
            // an internal error the client gets no details about.
            Err(err) => match err.downcast_ref::<ClientError>() {
                Some(client) => response::text(
                    client.status,
                    &format!("Request not valid:\n{}\n", client.message),
                ),
                None => {
                    error!(%method, path, error = %format!("{err:#}"), "request failed");
                    response::text(StatusCode::INTERNAL_SERVER_ERROR, "internal error\n")
                }
            },
        };

        match &result {
            Ok(resp) => {
                info!(
                    %method,
                    path,
                    response_code = resp.status().as_u16(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "request handled"
                );
            }
            Err(err) => {
                error!(
                    %method,
                    path,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    "request failed"
                );
            }
        }

        result.map_err(Into::into)
    }
}
