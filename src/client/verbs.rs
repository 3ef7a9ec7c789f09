//! HTTP verb table and argument normalization.
//!
//! Every verb helper on the facade funnels into [`build_request`], which turns
//! `(url, data?, config?)` into one [`RequestConfig`]. Whether the `data`
//! argument is honored is a property of the verb, not of the call site.

use crate::types::RequestConfig;
use bytes::Bytes;
use http::Method;

/// The verbs the facade exposes helpers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
}

impl Verb {
    /// Every verb, in table order.
    pub const ALL: [Verb; 7] = [
        Verb::Get,
        Verb::Delete,
        Verb::Head,
        Verb::Options,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
    ];

    /// The HTTP method for this verb.
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Delete => Method::DELETE,
            Verb::Head => Method::HEAD,
            Verb::Options => Method::OPTIONS,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
        }
    }

    /// Whether the helper for this verb takes a body argument.
    pub fn has_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }
}

/// Normalize verb helper arguments into one request descriptor.
///
/// The per-call `config` is the starting point; the verb's method and `url`
/// always replace whatever it carried. `data` is applied only for verbs with
/// a body, and only when given.
///
/// # Examples
///
/// ```
/// use rxhttp::client::{build_request, Verb};
/// use http::Method;
///
/// let descriptor = build_request(Verb::Post, "http://awesome.me", Some("{}".into()), None);
/// assert_eq!(descriptor.method, Some(Method::POST));
/// assert_eq!(descriptor.data.as_deref(), Some(&b"{}"[..]));
/// ```
pub fn build_request(
    verb: Verb,
    url: &str,
    data: Option<Bytes>,
    config: Option<RequestConfig>,
) -> RequestConfig {
    let mut descriptor = config.unwrap_or_default();
    descriptor.method = Some(verb.method());
    descriptor.url = Some(url.to_string());
    if verb.has_body() {
        if let Some(data) = data {
            descriptor.data = Some(data);
        }
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_table() {
        let with_body: Vec<Verb> = Verb::ALL.into_iter().filter(|v| v.has_body()).collect();
        assert_eq!(with_body, vec![Verb::Post, Verb::Put, Verb::Patch]);
    }

    #[test]
    fn test_url_only() {
        let descriptor = build_request(Verb::Get, "http://awesome.me", None, None);
        assert_eq!(descriptor.method, Some(Method::GET));
        assert_eq!(descriptor.url.as_deref(), Some("http://awesome.me"));
        assert!(descriptor.data.is_none());
    }

    #[test]
    fn test_config_is_kept_but_method_and_url_win() {
        let config = RequestConfig::new()
            .with_method(Method::PUT)
            .with_url("http://elsewhere")
            .with_header("x-a", "1");
        let descriptor = build_request(
            Verb::Post,
            "http://awesome.me",
            Some(Bytes::from_static(b"body")),
            Some(config),
        );
        assert_eq!(descriptor.method, Some(Method::POST));
        assert_eq!(descriptor.url.as_deref(), Some("http://awesome.me"));
        assert_eq!(descriptor.headers["x-a"], "1");
        assert_eq!(descriptor.data, Some(Bytes::from_static(b"body")));
    }

    #[test]
    fn test_bodyless_verbs_ignore_data_argument() {
        let descriptor = build_request(
            Verb::Delete,
            "http://awesome.me",
            Some(Bytes::from_static(b"ignored")),
            None,
        );
        assert!(descriptor.data.is_none());
    }
}
