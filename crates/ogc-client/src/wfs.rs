//! Feature service (WFS) client.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ogc_capabilities::{ParameterCatalog, Protocol, WfsCapabilities};
use ogc_common::{normalize_base, with_query, HttpClient, OgcResult, QueryArgs};

use crate::access::DataAccess;
use crate::config::ClientConfig;
use crate::request::{kvp_url, warn_excluded, wire_pairs, WFS_DRIVER};
use crate::stream::{Ceiling, FeatureStream, Segment, Selection};

/// Client of one WFS endpoint at one protocol version.
pub struct FeatureClient {
    capabilities: WfsCapabilities,
    catalog: &'static ParameterCatalog,
    access: Arc<dyn DataAccess>,
    config: ClientConfig,
}

impl FeatureClient {
    /// Fetch the capabilities (and stored queries) of the service.
    #[instrument(skip(http, access, config))]
    pub fn connect(
        base_url: &str,
        version: &str,
        http: Arc<dyn HttpClient>,
        access: Arc<dyn DataAccess>,
        config: ClientConfig,
    ) -> OgcResult<Self> {
        let catalog = ParameterCatalog::for_version(Protocol::Wfs, version)?;
        let capabilities = WfsCapabilities::fetch(
            http.as_ref(),
            &normalize_base(base_url),
            version,
            &config.fetch_options(),
        )?;
        info!(base_url, version, "WFS service ready");
        Ok(Self {
            capabilities,
            catalog,
            access,
            config,
        })
    }

    /// Build from capabilities fetched elsewhere.
    pub fn from_capabilities(
        capabilities: WfsCapabilities,
        access: Arc<dyn DataAccess>,
        config: ClientConfig,
    ) -> OgcResult<Self> {
        let catalog = ParameterCatalog::for_version(Protocol::Wfs, capabilities.version())?;
        Ok(Self {
            capabilities,
            catalog,
            access,
            config,
        })
    }

    pub fn capabilities(&self) -> &WfsCapabilities {
        &self.capabilities
    }

    pub fn version(&self) -> &str {
        self.capabilities.version()
    }

    /// Recognized GetFeature parameters of this version.
    pub fn feature_parameters(&self) -> &'static ParameterCatalog {
        self.catalog
    }

    /// `CountDefault` when advertised, else the configured `max_features`.
    pub fn ceiling(&self) -> Ceiling {
        Ceiling {
            limit: self
                .capabilities
                .count_default()
                .unwrap_or(self.config.max_features),
            paging: self.capabilities.implements_result_paging(),
        }
    }

    /// Validate `args` and build the GetFeature URL. Unrecognized arguments
    /// are dropped with a warning.
    pub fn get_feature_url(&self, args: &QueryArgs) -> OgcResult<String> {
        self.catalog.require(args)?;
        self.catalog.check_types(args)?;
        let (recognized, excluded) = self.catalog.partition(args);
        warn_excluded(&excluded, &self.catalog.names(), "WFS", self.version());
        kvp_url(
            self.capabilities.base_url(),
            "WFS",
            self.version(),
            "GetFeature",
            &recognized,
        )
    }

    /// Stream the features answering `args`, optionally filtered by `predicate`
    /// on every returned layer.
    #[instrument(skip(self, args))]
    pub fn get_feature(&self, predicate: Option<&str>, args: &QueryArgs) -> OgcResult<FeatureStream> {
        let url = self.get_feature_url(args)?;
        let source = self.access.open(&format!("{}{}", WFS_DRIVER, url))?;
        let selection = match predicate {
            Some(predicate) => Selection::Filter {
                predicate: predicate.to_string(),
                ceiling: Some(self.ceiling()),
            },
            None => Selection::All,
        };
        Ok(FeatureStream::single(Segment::new(url, source, selection)))
    }

    /// Build the GetFeature URL of a stored query. Arguments the query does
    /// not declare are dropped with a warning.
    pub fn stored_query_url(&self, name: &str, args: &QueryArgs) -> OgcResult<String> {
        let query = self.capabilities.stored_queries().resolve(name)?;

        let mut declared = QueryArgs::new();
        for (param, value) in args.iter() {
            if query.has_parameter(param) {
                declared.insert(param, value.clone());
            } else {
                warn!(
                    parameter = param,
                    stored_query = %query.identifier,
                    "The parameter is not found in the stored query"
                );
            }
        }

        let mut pairs = vec![
            ("service".to_string(), "WFS".to_string()),
            ("version".to_string(), self.version().to_string()),
            ("request".to_string(), "GetFeature".to_string()),
            ("STOREDQUERY_ID".to_string(), query.identifier.clone()),
        ];
        pairs.extend(wire_pairs(&declared, str::to_string));
        with_query(self.capabilities.base_url(), pairs)
    }

    /// Stream the features returned by a stored query, looked up by
    /// identifier or unique title.
    #[instrument(skip(self, args))]
    pub fn get_feature_from_stored_query(&self, name: &str, args: &QueryArgs) -> OgcResult<FeatureStream> {
        let url = self.stored_query_url(name, args)?;
        let source = self.access.open(&format!("{}{}", WFS_DRIVER, url))?;
        Ok(FeatureStream::single(Segment::new(url, source, Selection::All)))
    }
}
