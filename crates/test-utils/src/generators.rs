//! Payload generators for download tests.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

/// Build an in-memory zip archive holding `entries` as (name, content).
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .expect("Failed to start zip entry");
        writer
            .write_all(content)
            .expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip archive")
        .into_inner()
}

/// GML feature collection with `count` members of `type_name`.
pub fn feature_collection(type_name: &str, count: usize) -> String {
    let mut gml = String::from(
        "<wfs:FeatureCollection xmlns:wfs=\"http://www.opengis.net/wfs/2.0\">\n",
    );
    for i in 0..count {
        gml.push_str(&format!(
            "  <wfs:member><{t} id=\"{i}\"/></wfs:member>\n",
            t = type_name,
            i = i
        ));
    }
    gml.push_str("</wfs:FeatureCollection>");
    gml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_archive_is_readable() {
        let bytes = zip_archive(&[("a.gml", b"<a/>"), ("readme.txt", b"hi")]);
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_feature_collection_members() {
        let gml = feature_collection("gn:NamedPlace", 3);
        assert_eq!(gml.matches("<wfs:member>").count(), 3);
    }
}
