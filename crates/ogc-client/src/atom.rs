//! Atom bulk-download client.
//!
//! Leaf datasets (`.gml` files and `.gml` members of `.zip` archives) are
//! downloaded lazily while the stream is consumed.
//!
//! Leaf text is decoded as UTF-8 and re-encoded to ISO-8859-1 before it
//! reaches the access layer, dropping characters outside Latin-1. Known
//! upstream feeds mislabel their GML encoding; the access layer only reads
//! them correctly this way.

use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use ogc_common::{file_name, normalize_base, HttpClient, OgcError, OgcResult};

use crate::access::DataAccess;
use crate::config::ClientConfig;
use crate::feed::{fetch_body, looks_like_feed, AtomFeedResolver};
use crate::stream::{FeatureStream, Segment, Selection};

/// Decode `bytes` as UTF-8 (lossy) and re-encode as ISO-8859-1, dropping
/// characters Latin-1 cannot represent.
pub fn to_latin1(bytes: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter_map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

/// Comma-separated list, spaces removed, empty items skipped.
fn split_list(list: &str) -> Vec<String> {
    list.replace(' ', "")
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Client of one Atom download feed.
pub struct AtomClient {
    source: String,
    http: Arc<dyn HttpClient>,
    access: Arc<dyn DataAccess>,
    config: ClientConfig,
}

impl AtomClient {
    pub fn new(
        source: &str,
        http: Arc<dyn HttpClient>,
        access: Arc<dyn DataAccess>,
        config: ClientConfig,
    ) -> Self {
        Self {
            source: normalize_base(source),
            http,
            access,
            config,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the source names an XML feed document.
    pub fn is_atom(&self) -> bool {
        self.source.to_ascii_lowercase().ends_with(".xml")
    }

    /// Fetch the feed and resolve its data links lazily.
    #[instrument(skip(self), fields(source = %self.source))]
    pub fn links(&self) -> OgcResult<AtomFeedResolver> {
        if !self.is_atom() {
            return Err(OgcError::NotAtomFeed(format!(
                "The provided source is not an Atom feed: {}",
                self.source
            )));
        }
        let timeout = self.config.feed_timeout();
        let body = fetch_body(self.http.as_ref(), &self.source, timeout)?;
        if !looks_like_feed(&String::from_utf8_lossy(&body)) {
            return Err(OgcError::NotAtomFeed(format!(
                "Format not recognized. Valid format is Atom Feed: {}",
                self.source
            )));
        }
        Ok(AtomFeedResolver::new(
            Arc::clone(&self.http),
            timeout,
            &self.source,
            body,
        ))
    }

    /// Stream the features of the layers named in `type_names` (comma list,
    /// namespace prefixes optional on the layer side) from every `.gml` and
    /// `.zip` dataset of the feed, optionally restricted to the file names in
    /// `files` (comma list, any case).
    pub fn get_feature(&self, type_names: &str, files: Option<&str>) -> OgcResult<FeatureStream> {
        let resolver = self.links()?;
        let segments = LeafSegments {
            resolver,
            http: Arc::clone(&self.http),
            access: Arc::clone(&self.access),
            timeout: self.config.data_timeout(),
            type_names: split_list(type_names),
            files: files.map(|f| split_list(&f.to_uppercase())),
            pending: VecDeque::new(),
        };
        Ok(FeatureStream::new(segments))
    }
}

/// Opens one in-memory source per downloaded GML document.
struct LeafSegments {
    resolver: AtomFeedResolver,
    http: Arc<dyn HttpClient>,
    access: Arc<dyn DataAccess>,
    timeout: Duration,
    type_names: Vec<String>,
    files: Option<Vec<String>>,
    pending: VecDeque<(String, Vec<u8>)>,
}

impl LeafSegments {
    fn allowed(&self, name: &str) -> bool {
        self.files
            .as_ref()
            .map_or(true, |files| files.contains(&name.to_uppercase()))
    }

    /// GML documents of one leaf, re-encoded.
    fn download(&self, href: &str, name: &str) -> OgcResult<Vec<(String, Vec<u8>)>> {
        let body = fetch_body(self.http.as_ref(), href, self.timeout)?;
        if name.to_ascii_lowercase().ends_with(".gml") {
            return Ok(vec![(name.to_string(), to_latin1(&body))]);
        }

        let mut archive = zip::ZipArchive::new(Cursor::new(body))?;
        let mut documents = Vec::new();
        for index in 0..archive.len() {
            let mut member = archive.by_index(index)?;
            if !member.name().to_ascii_lowercase().ends_with(".gml") {
                continue;
            }
            let member_name = file_name(member.name()).to_string();
            let mut content = Vec::new();
            member.read_to_end(&mut content)?;
            documents.push((member_name, to_latin1(&content)));
        }
        debug!(href, documents = documents.len(), "Archive unpacked");
        Ok(documents)
    }
}

impl Iterator for LeafSegments {
    type Item = OgcResult<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((name, data)) = self.pending.pop_front() {
                let selection = Selection::Named(self.type_names.clone());
                return Some(
                    self.access
                        .open_memory(&name, &data)
                        .map(|source| Segment::new(name, source, selection)),
                );
            }

            let link = self.resolver.next()?;
            let name = file_name(&link.href).to_string();
            let lower = name.to_ascii_lowercase();
            if !(lower.ends_with(".gml") || lower.ends_with(".zip")) || !self.allowed(&name) {
                continue;
            }
            match self.download(&link.href, &name) {
                Ok(documents) => self.pending.extend(documents),
                Err(e) => warn!(href = %link.href, error = %e, "Failed to download dataset"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Feature, FieldDefn, FieldType, FieldValue};
    use crate::memory::{MemoryAccess, MemoryLayer};
    use test_utils::fixtures::atom;
    use test_utils::{feature_collection, zip_archive, MockHttp};

    fn named(text: &str) -> Feature {
        Feature {
            fid: None,
            fields: vec![(FieldDefn::new("text", FieldType::String), FieldValue::from(text))],
            geometry: None,
        }
    }

    fn access() -> Arc<MemoryAccess> {
        Arc::new(
            MemoryAccess::new()
                .with_source(
                    "NamedPlaces.gml",
                    vec![
                        MemoryLayer::new("gn:NamedPlace", vec![named("Catauña")]),
                        MemoryLayer::new("gn:GeographicalName", vec![named("x")]),
                    ],
                )
                .with_source(
                    "Addresses.gml",
                    vec![MemoryLayer::new("ad:Address", vec![named("a"), named("b")])],
                ),
        )
    }

    fn http() -> Arc<MockHttp> {
        let addresses = feature_collection("ad:Address", 2);
        let archive = zip_archive(&[
            ("data/Addresses.gml", addresses.as_bytes()),
            ("readme.txt", b"not a dataset".as_slice()),
        ]);
        Arc::new(atom::mock().route(atom::ZIP_URL, archive))
    }

    fn client(http: Arc<MockHttp>, access: Arc<MemoryAccess>) -> AtomClient {
        AtomClient::new(atom::FEED_A_URL, http, access, ClientConfig::default())
    }

    #[test]
    fn test_to_latin1_drops_unrepresentable_characters() {
        assert_eq!(to_latin1("Catauña €".as_bytes()), b"Catau\xF1a ".to_vec());
        assert_eq!(to_latin1(b"plain"), b"plain".to_vec());
    }

    #[test]
    fn test_is_atom() {
        let access = access();
        assert!(client(http(), access.clone()).is_atom());
        let not_atom = AtomClient::new(
            "https://example.org/atom/feed.json",
            http(),
            access,
            ClientConfig::default(),
        );
        assert!(!not_atom.is_atom());
        assert!(matches!(not_atom.get_feature("NamedPlace", None), Err(OgcError::NotAtomFeed(_))));
    }

    #[test]
    fn test_body_must_be_a_feed() {
        let http = Arc::new(MockHttp::new().route("https://example.org/atom/feed.xml", "{}"));
        let client = AtomClient::new(
            "https://example.org/atom/feed.xml",
            http,
            access(),
            ClientConfig::default(),
        );
        assert!(matches!(client.get_feature("NamedPlace", None), Err(OgcError::NotAtomFeed(_))));
    }

    #[test]
    fn test_get_feature_reads_gml_and_zip_leaves() {
        let access = access();
        let records: Vec<_> = client(http(), access.clone())
            .get_feature("NamedPlace, Address", None)
            .unwrap()
            .collect();
        let layers: Vec<&str> = records.iter().map(|r| r.layer()).collect();
        assert_eq!(layers, vec!["NamedPlace", "Address", "Address"]);

        let documents = access.log().memory_documents;
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].0, "NamedPlaces.gml");
        assert!(documents[0].1.windows(6).any(|w| w == b"Catau\xF1a"));
        assert!(!String::from_utf8_lossy(&documents[0].1).contains('€'));
        assert_eq!(documents[1].0, "Addresses.gml");
        assert_eq!(access.log().closed, 2);
    }

    #[test]
    fn test_files_allow_list() {
        let http = http();
        let access = access();
        let count = client(http.clone(), access.clone())
            .get_feature("Address", Some("addresses.zip"))
            .unwrap()
            .count();
        assert_eq!(count, 2);
        assert_eq!(http.count_containing("NamedPlaces.gml"), 0);
        assert_eq!(access.log().memory_documents.len(), 1);
    }

    #[test]
    fn test_leaves_downloaded_lazily() {
        let http = http();
        let mut stream = client(http.clone(), access()).get_feature("NamedPlace", None).unwrap();
        assert_eq!(http.count_containing("/data/"), 0);
        assert!(stream.next().is_some());
        assert_eq!(http.count_containing("Addresses.zip"), 0);
        stream.close();
        assert!(stream.next().is_none());
        assert_eq!(http.count_containing("Addresses.zip"), 0);
    }

    #[test]
    fn test_failed_leaf_download_is_skipped() {
        let http = Arc::new(atom::mock());
        let count = client(http, access()).get_feature("NamedPlace,Address", None).unwrap().count();
        assert_eq!(count, 1);
    }
}
