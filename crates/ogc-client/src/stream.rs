//! Forward-only cursor over the records of one or more opened sources.
//!
//! A stream walks a sequence of segments. Each segment is an opened
//! [`DataSource`] plus a selection of what to read from it. Segments are
//! produced lazily so Atom leaves are only downloaded when the caller gets
//! that far. Errors after iteration began are logged and end the stream.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, error, info, warn};

use ogc_common::OgcResult;

use crate::access::{DataSource, ResultSet};
use crate::record::{Record, UniquenessTracker};

/// Warning logged when a non-paging service may have cut its answer short.
pub const CEILING_WARNING: &str =
    "Max number of features has been reached. Please, contact your data provider to request results paging.";

/// Result-count ceiling of a service that may not page its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ceiling {
    pub limit: u64,
    pub paging: bool,
}

impl Ceiling {
    /// True when `count` reached the limit and the service does not page.
    pub fn reached(&self, count: u64) -> bool {
        count >= self.limit && !self.paging
    }
}

/// What to read from a segment's source.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Every layer.
    All,
    /// Layers whose prefix-stripped name is listed.
    Named(Vec<String>),
    /// `SELECT * FROM <layer> WHERE <predicate>` on every layer.
    Filter {
        predicate: String,
        ceiling: Option<Ceiling>,
    },
}

/// An opened source and the selection to read from it.
pub struct Segment {
    pub label: String,
    pub source: Box<dyn DataSource>,
    pub selection: Selection,
}

impl Segment {
    pub fn new(label: impl Into<String>, source: Box<dyn DataSource>, selection: Selection) -> Self {
        Self {
            label: label.into(),
            source,
            selection,
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("label", &self.label)
            .field("selection", &self.selection)
            .finish()
    }
}

/// Layer name without its namespace prefix.
pub fn strip_namespace(name: &str) -> &str {
    match name.split(':').collect::<Vec<_>>().as_slice() {
        [_, local] => local,
        _ => name,
    }
}

type Segments = Box<dyn Iterator<Item = OgcResult<Segment>> + Send>;

struct Cursor {
    result: Box<dyn ResultSet>,
    layer: String,
    from_filter: bool,
}

struct Active {
    segment: Segment,
    layers: VecDeque<String>,
    cursor: Option<Cursor>,
}

/// Lazy, single-pass stream of [`Record`]s.
///
/// Dropping the stream closes it.
pub struct FeatureStream {
    segments: Segments,
    active: Option<Active>,
    uniqueness: UniquenessTracker,
    warnings: Vec<String>,
    closed: bool,
}

impl FeatureStream {
    /// A stream over lazily produced segments.
    pub fn new(segments: impl Iterator<Item = OgcResult<Segment>> + Send + 'static) -> Self {
        Self {
            segments: Box::new(segments),
            active: None,
            uniqueness: UniquenessTracker::default(),
            warnings: Vec::new(),
            closed: false,
        }
    }

    /// A stream over one already opened segment.
    pub fn single(segment: Segment) -> Self {
        Self::new(std::iter::once(Ok(segment)))
    }

    /// A stream that yields nothing.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Warnings raised so far (result ceilings reached).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the current result set and source. Further calls to `next`
    /// return `None`.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            finish(active);
        }
        if !self.closed {
            debug!("Feature stream closed");
        }
        self.closed = true;
        self.segments = Box::new(std::iter::empty());
    }

    fn open_next_segment(&mut self) -> Option<()> {
        match self.segments.next()? {
            Ok(segment) => {
                let names = segment.source.layer_names();
                let layers = match &segment.selection {
                    Selection::Named(wanted) => names
                        .into_iter()
                        .filter(|n| wanted.iter().any(|w| w == strip_namespace(n)))
                        .collect(),
                    _ => names.into_iter().collect(),
                };
                debug!(segment = %segment.label, "Reading segment");
                self.active = Some(Active {
                    segment,
                    layers,
                    cursor: None,
                });
                Some(())
            }
            Err(e) => {
                error!(error = %e, "Failed to open the next source; ending stream");
                None
            }
        }
    }

    fn open_layer(&mut self, layer: String) -> OgcResult<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        let (result, from_filter) = match &active.segment.selection {
            Selection::Filter { predicate, ceiling } => {
                let query = format!("SELECT * FROM {} WHERE {}", strip_namespace(&layer), predicate);
                let result = active.segment.source.execute_sql(&query)?;
                let count = result.feature_count();
                info!(query = %query, count, "Features found");
                if let Some(ceiling) = ceiling {
                    if ceiling.reached(count) {
                        warn!(limit = ceiling.limit, count, "{}", CEILING_WARNING);
                        self.warnings.push(CEILING_WARNING.to_string());
                    }
                }
                (result, true)
            }
            _ => {
                let result = active.segment.source.layer(&layer)?;
                info!(layer = %layer, count = result.feature_count(), "Features found");
                (result, false)
            }
        };
        active.cursor = Some(Cursor {
            result,
            layer: strip_namespace(&layer).to_string(),
            from_filter,
        });
        Ok(())
    }
}

fn finish(mut active: Active) {
    if let Some(cursor) = active.cursor.take() {
        release(&mut active.segment, cursor);
    }
    active.segment.source.close();
}

fn release(segment: &mut Segment, cursor: Cursor) {
    if cursor.from_filter {
        segment.source.release_result_set(cursor.result);
    }
}

impl Iterator for FeatureStream {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if self.closed {
                return None;
            }

            let Some(active) = self.active.as_mut() else {
                if self.open_next_segment().is_none() {
                    self.close();
                }
                continue;
            };

            if let Some(cursor) = active.cursor.as_mut() {
                match cursor.result.next_feature() {
                    Ok(Some(feature)) => {
                        let layer = cursor.layer.clone();
                        let repeated = self.uniqueness.check(&layer, &feature);
                        return Some(Record::new(&layer, feature, repeated));
                    }
                    Ok(None) => {
                        if let Some(cursor) = active.cursor.take() {
                            release(&mut active.segment, cursor);
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read feature; ending stream");
                        self.close();
                    }
                }
                continue;
            }

            match active.layers.pop_front() {
                Some(layer) => {
                    if let Err(e) = self.open_layer(layer) {
                        error!(error = %e, "Failed to open layer; ending stream");
                        self.close();
                    }
                }
                None => {
                    if let Some(active) = self.active.take() {
                        finish(active);
                    }
                }
            }
        }
    }
}

impl Drop for FeatureStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for FeatureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureStream")
            .field("active", &self.active.as_ref().map(|a| &a.segment.label))
            .field("warnings", &self.warnings)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{DataAccess, Feature, FieldDefn, FieldType, FieldValue};
    use crate::memory::{MemoryAccess, MemoryLayer};
    use ogc_common::OgcError;

    fn places(count: i64) -> Vec<Feature> {
        (0..count)
            .map(|i| Feature {
                fid: Some(i),
                fields: vec![
                    (FieldDefn::new("id", FieldType::Integer).unique(), FieldValue::Integer(i % 3)),
                    (FieldDefn::new("population", FieldType::Integer), FieldValue::Integer(i * 10)),
                ],
                geometry: None,
            })
            .collect()
    }

    fn access(count: i64) -> MemoryAccess {
        MemoryAccess::new().with_source(
            "WFS:https://example.org/wfs",
            vec![
                MemoryLayer::new("gn:NamedPlace", places(count)),
                MemoryLayer::new("au:AdministrativeUnit", places(2)),
            ],
        )
    }

    fn segment(access: &MemoryAccess, selection: Selection) -> Segment {
        let source = access.open("WFS:https://example.org/wfs").unwrap();
        Segment::new("wfs", source, selection)
    }

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("gn:NamedPlace"), "NamedPlace");
        assert_eq!(strip_namespace("NamedPlace"), "NamedPlace");
        assert_eq!(strip_namespace("a:b:c"), "a:b:c");
    }

    #[test]
    fn test_all_layers_in_order() {
        let access = access(4);
        let records: Vec<Record> = FeatureStream::single(segment(&access, Selection::All)).collect();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].layer(), "NamedPlace");
        assert_eq!(records[5].layer(), "AdministrativeUnit");
        assert_eq!(access.log().closed, 1);
    }

    #[test]
    fn test_named_selection() {
        let access = access(4);
        let stream = FeatureStream::single(segment(
            &access,
            Selection::Named(vec!["AdministrativeUnit".to_string()]),
        ));
        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn test_uniqueness_violations_within_layer() {
        let access = access(4);
        let records: Vec<Record> = FeatureStream::single(segment(&access, Selection::All)).collect();
        // ids 0, 1, 2, 0 in the first layer
        assert!(records[0].is_valid());
        assert_eq!(records[3].unique_violations(), ["id".to_string()]);
        // the second layer starts over
        assert!(records[4].is_valid());
    }

    #[test]
    fn test_filter_reaching_ceiling_warns_without_truncating() {
        let access = access(150);
        let mut stream = FeatureStream::single(segment(
            &access,
            Selection::Filter {
                predicate: "population >= 0".to_string(),
                ceiling: Some(Ceiling {
                    limit: 100,
                    paging: false,
                }),
            },
        ));
        let count = stream.by_ref().count();
        assert_eq!(count, 152);
        assert_eq!(stream.warnings(), [CEILING_WARNING.to_string()]);

        let log = access.log();
        assert_eq!(log.queries.len(), 2);
        assert_eq!(log.queries[0], "SELECT * FROM NamedPlace WHERE population >= 0");
        assert_eq!(log.released, 2);
    }

    #[test]
    fn test_paging_service_does_not_warn() {
        let access = access(150);
        let mut stream = FeatureStream::single(segment(
            &access,
            Selection::Filter {
                predicate: "population >= 0".to_string(),
                ceiling: Some(Ceiling {
                    limit: 100,
                    paging: true,
                }),
            },
        ));
        assert_eq!(stream.by_ref().count(), 152);
        assert!(stream.warnings().is_empty());
    }

    #[test]
    fn test_close_releases_and_ends() {
        let access = access(10);
        let mut stream = FeatureStream::single(segment(
            &access,
            Selection::Filter {
                predicate: "id = 1".to_string(),
                ceiling: None,
            },
        ));
        assert!(stream.next().is_some());
        stream.close();
        assert!(stream.next().is_none());

        let log = access.log();
        assert_eq!(log.released, 1);
        assert_eq!(log.closed, 1);
    }

    #[test]
    fn test_drop_closes_source() {
        let access = access(10);
        {
            let mut stream = FeatureStream::single(segment(&access, Selection::All));
            stream.next();
        }
        assert_eq!(access.log().closed, 1);
    }

    #[test]
    fn test_segment_error_ends_stream() {
        let access = access(2);
        let segments = vec![
            Ok(segment(&access, Selection::All)),
            Err(OgcError::DataAccess("broken archive".to_string())),
            Ok(segment(&access, Selection::All)),
        ];
        let stream = FeatureStream::new(segments.into_iter());
        assert_eq!(stream.count(), 4);
    }

    #[test]
    fn test_invalid_filter_ends_stream() {
        let access = access(2);
        let stream = FeatureStream::single(segment(
            &access,
            Selection::Filter {
                predicate: "name LIKE 'x'".to_string(),
                ceiling: None,
            },
        ));
        assert_eq!(stream.count(), 0);
        assert_eq!(access.log().closed, 1);
    }
}
