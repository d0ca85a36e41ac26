//! Splits query strings and form-urlencoded bodies into their values.

use std::collections::HashMap;

use crate::helpers::http::FormUrlDecoded;

/// Every value supplied for each key of a query string, in order of appearance.
pub type QueryStringMapping = HashMap<String, Vec<FormUrlDecoded>>;

/// Splits `query` on `&` and `;` into decoded key/value pairs.
///
/// A pair without `=` is dropped, as is a key or value which does not decode to utf8.
pub fn split(query: Option<&str>) -> QueryStringMapping {
    query
        .into_iter()
        .flat_map(|q| q.split(|c: char| c == '&' || c == ';'))
        .filter_map(|pair| pair.split_once('='))
        .fold(QueryStringMapping::new(), |mut mapping, (k, v)| {
            if let Some(key) = FormUrlDecoded::new(k) {
                let values = mapping.entry(key.into_inner()).or_default();
                values.extend(FormUrlDecoded::new(v));
            }
            mapping
        })
}

/// Returns the first value supplied for `key`, if any.
pub fn first<'a>(mapping: &'a QueryStringMapping, key: &str) -> Option<&'a str> {
    mapping
        .get(key)
        .and_then(|values| values.first())
        .map(AsRef::as_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(qsm: &QueryStringMapping) -> Vec<(&str, Vec<&str>)> {
        let mut pairs: Vec<_> = qsm
            .iter()
            .map(|(k, v)| (k.as_str(), v.iter().map(AsRef::as_ref).collect::<Vec<_>>()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }

    #[test]
    fn splits_on_both_separators() {
        assert_eq!(
            sorted(&split(Some("a=b;c=d&e=f"))),
            vec![("a", vec!["b"]), ("c", vec!["d"]), ("e", vec!["f"])],
        );
    }

    #[test]
    fn repeated_keys_keep_every_value() {
        assert_eq!(
            sorted(&split(Some("a=b&a=d&e=f"))),
            vec![("a", vec!["b", "d"]), ("e", vec!["f"])],
        );
    }

    #[test]
    fn pairs_need_an_equals_sign() {
        assert!(split(Some("a&b")).is_empty());
        assert!(split(None).is_empty());
        assert_eq!(
            sorted(&split(Some("a=b=c&d=e+f"))),
            vec![("a", vec!["b=c"]), ("d", vec!["e f"])]
        );
    }

    #[test]
    fn first_value_wins() {
        let qsm = split(Some("name=one&name=two"));
        assert_eq!(first(&qsm, "name"), Some("one"));
        assert_eq!(first(&qsm, "missing"), None);
    }
}
