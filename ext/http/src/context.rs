//! Path and query string helpers.

/// The query string after `?`, if any.
#[must_use]
pub fn parse_query_string(path: &str) -> Option<&str> {
    path.split_once('?').map(|(_, query)| query)
}

/// The path before `?`, or the whole path.
#[must_use]
pub fn parse_path_only(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

/// Iterate `key=value` pairs of a query string.
///
/// A bare flag such as `pretty` yields an empty value. Empty segments from
/// doubled `&` are skipped. Values are not percent-decoded.
pub fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

/// First value of `name` in a query string.
#[must_use]
pub fn get_query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query_pairs(query).find_map(|(key, value)| (key == name).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_split() {
        assert_eq!(
            parse_query_string("/logs/_search?size=0&q=error"),
            Some("size=0&q=error")
        );
        assert_eq!(parse_query_string("/logs/_search"), None);
        assert_eq!(parse_query_string("/_search?"), Some(""));
        assert_eq!(parse_path_only("/logs/_search?size=0"), "/logs/_search");
        assert_eq!(parse_path_only("/logs/_search"), "/logs/_search");
    }

    #[test]
    fn flags_have_empty_values() {
        let pairs: Vec<_> = query_pairs("pretty&size=10&&human=true").collect();
        assert_eq!(pairs, [("pretty", ""), ("size", "10"), ("human", "true")]);
    }

    #[test]
    fn first_value_wins() {
        let query = "size=1&size=2&q=a=b";
        assert_eq!(get_query_param(query, "size"), Some("1"));
        assert_eq!(get_query_param(query, "q"), Some("a=b"));
        assert_eq!(get_query_param(query, "from"), None);
        assert_eq!(get_query_param("pretty", "pretty"), Some(""));
    }
}
