//! Endpoint URL composition.

use url::Url;

use crate::error::{Error, Result};

/// Compose `base`, a relative `path`, and ordered query pairs into one absolute URL.
///
/// Query pairs are appended in the order given and percent-encoded. This is the
/// only place an endpoint is validated before it reaches the network.
pub fn build_url<K, V>(base: &str, path: &str, query: &[(K, V)]) -> Result<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    let mut url = Url::parse(&raw).map_err(|e| Error::InvalidEndpoint(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::InvalidEndpoint(format!("{raw}: not an absolute URL")));
    }

    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_QUERY: &[(&str, &str)] = &[];

    #[test]
    fn test_joins_base_and_path() {
        let url = build_url("https://api.metisai.ir", "api/v1/meta", NO_QUERY).unwrap();
        assert_eq!(url.as_str(), "https://api.metisai.ir/api/v1/meta");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_normalizes_slashes() {
        let url = build_url("http://localhost:8080/", "/api/v1/meta", NO_QUERY).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/meta");
    }

    #[test]
    fn test_keeps_base_path_prefix() {
        let url = build_url("http://localhost:8080/proxy", "api/v1/meta", NO_QUERY).unwrap();
        assert_eq!(url.path(), "/proxy/api/v1/meta");
    }

    #[test]
    fn test_query_in_insertion_order() {
        let query = [("size", "10"), ("page", "0"), ("botId", "b-1")];
        let url = build_url("http://localhost", "api/v1/chat/sessions", &query).unwrap();
        assert_eq!(url.query(), Some("size=10&page=0&botId=b-1"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("size".to_string(), "10".to_string()),
                ("page".to_string(), "0".to_string()),
                ("botId".to_string(), "b-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_values_are_encoded() {
        let query = [("q".to_string(), "a b&c".to_string())];
        let url = build_url("http://localhost", "search", &query).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("q".to_string(), "a b&c".to_string())]);
    }

    #[test]
    fn test_invalid_base_is_invalid_endpoint() {
        let err = build_url("not a url", "api/v1/meta", NO_QUERY).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));

        let err = build_url("mailto:someone", "x", NO_QUERY).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }
}
