// Query string helpers shared by every dispatch path

use url::form_urlencoded;

/// Encode parameters as `key=value` pairs joined by `&`
///
/// Values are form-urlencoded (spaces become `+`), keys keep their order.
pub fn build_query<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}

/// Append encoded parameters to `uri`
///
/// Uses `?` unless the uri already carries a query component, then `&`.
/// An empty parameter list leaves the uri untouched.
pub fn append_query<K, V>(uri: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return uri.to_string();
    }

    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}{}", uri, separator, build_query(params))
}
