//! Request URL construction.

use url::Url;

use crate::OgcResult;

/// Service base URL as given by the caller, without a dangling `?`.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('?').to_string()
}

/// Append `pairs` to `base` as percent-encoded query parameters.
///
/// Pairs already present in `base` are kept in front.
pub fn with_query<I, K, V>(base: &str, pairs: I) -> OgcResult<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = Url::parse(&normalize_base(base))?;
    let mut pairs = pairs.into_iter().peekable();
    if pairs.peek().is_some() {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key.as_ref(), value.as_ref());
        }
    }
    Ok(url.into())
}

/// `base` followed by `path`, with exactly one `/` between them.
pub fn join_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        normalize_base(base).trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// The last path segment of `href` (its file name).
pub fn file_name(href: &str) -> &str {
    let path = href.split(|c| c == '?' || c == '#').next().unwrap_or(href);
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query() {
        let url = with_query(
            "https://www.ign.es/wfs/inspire?",
            [("service", "WFS"), ("version", "2.0.0"), ("request", "GetCapabilities")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.ign.es/wfs/inspire?service=WFS&version=2.0.0&request=GetCapabilities"
        );
    }

    #[test]
    fn test_with_query_keeps_existing_pairs() {
        let url = with_query("https://example.org/ows?map=roads", [("service", "WFS")]).unwrap();
        assert_eq!(url, "https://example.org/ows?map=roads&service=WFS");
    }

    #[test]
    fn test_with_query_encodes_values() {
        let url = with_query("https://example.org/wfs", [("NAME", "San Sebastián")]).unwrap();
        assert!(url.starts_with("https://example.org/wfs?NAME=San+Sebasti"));
    }

    #[test]
    fn test_with_query_rejects_relative_base() {
        assert!(with_query("not a url", [("a", "b")]).is_err());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(
            join_path("https://api-features.idee.es/", "/collections"),
            "https://api-features.idee.es/collections"
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("https://example.org/data/AD_0801.gml"), "AD_0801.gml");
        assert_eq!(file_name("https://example.org/a.zip?x=1"), "a.zip");
    }
}
