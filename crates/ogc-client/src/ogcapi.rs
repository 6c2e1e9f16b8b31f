//! OGC API (Features, Coverages, Maps) client.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use ogc_capabilities::{ApiKind, OpenApiDocument, ParameterLocation};
use ogc_common::{join_path, normalize_base, with_query, HttpClient, OgcError, OgcResult, QueryArgs};

use crate::access::DataAccess;
use crate::config::ClientConfig;
use crate::feed::fetch_body;
use crate::request::{kebab_case, save_payload, wire_pairs, OAPIF_DRIVER, OGCAPI_DRIVER};
use crate::stream::{FeatureStream, Segment, Selection};

/// Body of an OGC API coverage response.
#[derive(Debug, Clone, PartialEq)]
pub enum CoveragePayload {
    Json(Value),
    Text(String),
}

/// Client of one OGC API landing page.
pub struct OgcApiClient {
    document: OpenApiDocument,
    http: Arc<dyn HttpClient>,
    access: Arc<dyn DataAccess>,
    config: ClientConfig,
}

impl OgcApiClient {
    /// Fetch the OpenAPI document and the collection listing.
    #[instrument(skip(http, access, config))]
    pub fn connect(
        base_url: &str,
        http: Arc<dyn HttpClient>,
        access: Arc<dyn DataAccess>,
        config: ClientConfig,
    ) -> OgcResult<Self> {
        let document = OpenApiDocument::fetch(
            http.as_ref(),
            normalize_base(base_url).trim_end_matches('/'),
            &config.fetch_options(),
        )?;
        info!(base_url, kind = %document.kind(), "OGC API service ready");
        Ok(Self {
            document,
            http,
            access,
            config,
        })
    }

    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    pub fn kind(&self) -> ApiKind {
        self.document.kind()
    }

    fn driver(&self) -> &'static str {
        match self.kind() {
            ApiKind::Features => OAPIF_DRIVER,
            _ => OGCAPI_DRIVER,
        }
    }

    fn expect_kind(&self, expected: ApiKind) -> OgcResult<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(OgcError::ApiKindMismatch {
                expected: expected.to_string(),
                actual: self.kind().to_string(),
            })
        }
    }

    /// `{base}/collections/{id}/{items|coverage|map}` with the arguments the
    /// operation declares as query parameters. Argument names are matched
    /// as given, then kebab-cased; other arguments are dropped with a warning.
    pub fn full_url(&self, collection: &str, args: &QueryArgs) -> OgcResult<String> {
        self.document.require_collection(collection)?;
        let resource = self.kind().resource().ok_or_else(|| OgcError::ApiKindMismatch {
            expected: "Features, Coverages or Maps".to_string(),
            actual: self.kind().to_string(),
        })?;
        let path = format!("collections/{}/{}", collection, resource);

        let known: HashSet<String> = self
            .document
            .operation_parameters(&format!("/{}", path))
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.location == ParameterLocation::Query)
            .map(|p| p.name)
            .collect();

        let mut accepted = QueryArgs::new();
        let mut excluded = Vec::new();
        for (name, value) in args.iter() {
            if known.contains(name) {
                accepted.insert(name, value.clone());
            } else if known.contains(&kebab_case(name)) {
                accepted.insert(kebab_case(name), value.clone());
            } else {
                excluded.push(name);
            }
        }
        if !excluded.is_empty() {
            let mut valid: Vec<&String> = known.iter().collect();
            valid.sort();
            warn!(?excluded, ?valid, collection, "The following parameters have been excluded");
        }

        with_query(
            &join_path(self.document.base_url(), &path),
            wire_pairs(&accepted, str::to_string),
        )
    }

    /// True when `collection` advertises `crs`, which must be a CRS URI.
    pub fn is_output_crs_supported(&self, collection: &str, crs: &str) -> OgcResult<bool> {
        self.document.is_output_crs_supported(
            self.http.as_ref(),
            collection,
            crs,
            self.config.describe_timeout(),
        )
    }

    /// Stream the items of `collection`, optionally filtered by `predicate`.
    ///
    /// A `crs` argument must be a URI advertised by the collection.
    #[instrument(skip(self, args))]
    pub fn get_feature(
        &self,
        collection: &str,
        predicate: Option<&str>,
        args: &QueryArgs,
    ) -> OgcResult<FeatureStream> {
        self.expect_kind(ApiKind::Features)?;
        self.document.require_collection(collection)?;
        if let Some(crs) = args.get_ignore_case("crs").and_then(|v| v.as_str()) {
            if !self.is_output_crs_supported(collection, crs)? {
                return Err(OgcError::UnsupportedCrs {
                    collection: collection.to_string(),
                    crs: crs.to_string(),
                });
            }
        }

        let url = self.full_url(collection, args)?;
        let source = self.access.open(&format!("{}{}", self.driver(), url))?;
        let selection = match predicate {
            Some(predicate) => Selection::Filter {
                predicate: predicate.to_string(),
                ceiling: None,
            },
            None => Selection::All,
        };
        Ok(FeatureStream::single(Segment::new(url, source, selection)))
    }

    /// Fetch a coverage of `collection`. JSON unless `f` asks for another format.
    #[instrument(skip(self, args))]
    pub fn get_coverage(
        &self,
        collection: &str,
        args: &QueryArgs,
        save_to: Option<&Path>,
    ) -> OgcResult<CoveragePayload> {
        self.expect_kind(ApiKind::Coverages)?;
        let url = self.full_url(collection, args)?;
        let body = fetch_body(self.http.as_ref(), &url, self.config.data_timeout())?;
        if let Some(path) = save_to {
            save_payload(path, &body);
        }

        let json = match args.get("f") {
            None => true,
            Some(f) => f.as_str() == Some("json"),
        };
        if json {
            Ok(CoveragePayload::Json(serde_json::from_slice(&body)?))
        } else {
            Ok(CoveragePayload::Text(String::from_utf8_lossy(&body).into_owned()))
        }
    }

    /// Stream the map raster of `collection`, saving it first when `save_to`
    /// is given.
    #[instrument(skip(self, args))]
    pub fn get_map(
        &self,
        collection: &str,
        args: &QueryArgs,
        save_to: Option<&Path>,
    ) -> OgcResult<FeatureStream> {
        self.expect_kind(ApiKind::Maps)?;
        let url = self.full_url(collection, args)?;
        if let Some(path) = save_to {
            match fetch_body(self.http.as_ref(), &url, self.config.data_timeout()) {
                Ok(body) => save_payload(path, &body),
                Err(e) => warn!(error = %e, "Map download failed"),
            }
        }
        let source = self.access.open(&format!("{}{}", self.driver(), url))?;
        Ok(FeatureStream::single(Segment::new(url, source, Selection::All)))
    }
}
