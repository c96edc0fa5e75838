//! Request matching logic.
//!
//! # Responsibilities
//! - Match HTTP method (set membership)
//! - Match path patterns segment by segment, capturing `:name` variables
//! - Match path prefixes for sub-collections
//! - Match host header (exact match, case-insensitive)
//! - Pick the first provider whose matchers all succeed
//!
//! # Design Decisions
//! - Matchers are stateless; captures are returned, never stored
//! - Empty path segments are ignored (`/a//b/` is `/a/b`)
//! - Segments are percent-decoded before comparison and capture
//! - Path matching is case-sensitive, host matching is not
//! - No regex; a pattern is a list of literal or variable segments
//! - First match wins; there is no best-match scoring

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::{Method, Request};
use percent_encoding::percent_decode_str;
use std::fmt;
use std::sync::Arc;

/// Path variables captured while matching, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Value bound to `name`; later captures shadow earlier ones.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn extend(&mut self, other: PathParams) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns the captured variables if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> Option<PathParams>;
}

/// Anything that bundles a set of matchers which must all succeed.
pub trait MatcherProvider {
    fn matchers(&self) -> &[Arc<dyn Matcher>];
}

/// Scans providers in order and returns the first full match.
pub struct RequestMatcher<'a, P> {
    providers: &'a [P],
}

impl<'a, P: MatcherProvider> RequestMatcher<'a, P> {
    pub fn new(providers: &'a [P]) -> Self {
        Self { providers }
    }

    pub fn find(&self, req: &Request<Body>) -> Option<(&'a P, PathParams)> {
        'providers: for provider in self.providers {
            let mut params = PathParams::new();
            for matcher in provider.matchers() {
                match matcher.matches(req) {
                    Some(captured) => params.extend(captured),
                    None => continue 'providers,
                }
            }
            return Some((provider, params));
        }
        None
    }
}

/// Matches the request method against a set.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request<Body>) -> Option<PathParams> {
        self.methods
            .contains(req.method())
            .then(PathParams::new)
    }
}

/// Matches the Host header, ignoring ASCII case. A port, when configured,
/// must match too.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    host: String,
}

impl HostMatcher {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Request<Body>) -> Option<PathParams> {
        let sent = req.headers().get(HOST)?.to_str().ok()?;
        sent.eq_ignore_ascii_case(&self.host).then(PathParams::new)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Variable, stored under its bound name (prefix applied).
    Variable(String),
}

/// A path template such as `/snippets/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse `pattern`; `:name` segments bind as `<var_prefix><name>`.
    pub fn new(pattern: &str, var_prefix: &str) -> Self {
        let segments = split_segments(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Variable(format!("{}{}", var_prefix, name)),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            source: join_paths(pattern, ""),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole path, or only its leading segments when `prefix_only`.
    /// Segments are compared and captured percent-decoded.
    fn capture(&self, path: &str, prefix_only: bool) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut actual = split_segments(path);
        for segment in &self.segments {
            let value = percent_decode_str(actual.next()?).decode_utf8_lossy();
            match segment {
                Segment::Literal(expected) if *expected != value => return None,
                Segment::Literal(_) => {}
                Segment::Variable(name) => params.push(name.clone(), value),
            }
        }
        if !prefix_only && actual.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Matches the full request path against a pattern and captures variables.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: PathPattern,
}

impl PatternMatcher {
    pub fn new(pattern: &str, var_prefix: &str) -> Self {
        Self {
            pattern: PathPattern::new(pattern, var_prefix),
        }
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

impl Matcher for PatternMatcher {
    fn matches(&self, req: &Request<Body>) -> Option<PathParams> {
        self.pattern.capture(req.uri().path(), false)
    }
}

/// Matches the leading path segments (segment-aware, so `/sub` does not
/// match `/subway`). Captures are discarded; the route pattern binds them.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: PathPattern,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: &str, var_prefix: &str) -> Self {
        Self {
            prefix: PathPattern::new(prefix, var_prefix),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> Option<PathParams> {
        self.prefix
            .capture(req.uri().path(), true)
            .map(|_| PathParams::new())
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Join two paths the way `path.join` would: one separator between
/// segments, a leading slash, no trailing slash.
pub fn join_paths(base: &str, tail: &str) -> String {
    let joined: Vec<&str> = split_segments(base).chain(split_segments(tail)).collect();
    format!("/{}", joined.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::default())
            .unwrap()
    }

    #[test]
    fn test_host_matcher() {
        let with_host = |host: &str| Request::builder().header(HOST, host).body(Body::empty()).unwrap();
        let matcher = HostMatcher::new("snippets.test");

        assert!(matcher.matches(&with_host("snippets.test")).is_some());
        assert!(matcher.matches(&with_host("Snippets.TEST")).is_some());
        assert!(matcher.matches(&with_host("snippets.test:8080")).is_none());
        assert!(matcher.matches(&with_host("other.test")).is_none());
        assert!(matcher.matches(&request(Method::GET, "/")).is_none());

        let with_port = HostMatcher::new("snippets.test:8080");
        assert!(with_port.matches(&with_host("snippets.test:8080")).is_some());
    }

    #[test]
    fn test_path_prefix_matcher() {
        let matcher = PathPrefixMatcher::new("/api", ":");

        assert!(matcher.matches(&request(Method::GET, "http://example.com/api/v1")).is_some());
        assert!(matcher.matches(&request(Method::GET, "http://example.com/api")).is_some());
        assert!(matcher.matches(&request(Method::GET, "http://example.com/apis")).is_none());
        assert!(matcher.matches(&request(Method::GET, "http://example.com/images")).is_none());
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new([Method::GET, Method::HEAD]);
        assert!(matcher.matches(&request(Method::HEAD, "/")).is_some());
        assert!(matcher.matches(&request(Method::POST, "/")).is_none());
    }

    #[test]
    fn test_pattern_captures_variables() {
        let matcher = PatternMatcher::new("/greetings/:firstname/:lastname", ":");
        let params = matcher
            .matches(&request(Method::GET, "http://example.com/greetings/John-Rodger/Doe"))
            .unwrap();
        assert_eq!(params.get(":firstname"), Some("John-Rodger"));
        assert_eq!(params.get(":lastname"), Some("Doe"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_pattern_decodes_segments() {
        let matcher = PatternMatcher::new("/hello/:name", ":");
        let params = matcher.matches(&request(Method::GET, "/hello/John%20Doe")).unwrap();
        assert_eq!(params.get(":name"), Some("John Doe"));

        let literal = PatternMatcher::new("/caf\u{e9}", ":");
        assert!(literal.matches(&request(Method::GET, "/caf%C3%A9")).is_some());
        assert!(PathPrefixMatcher::new("/my docs", ":")
            .matches(&request(Method::GET, "/my%20docs/1"))
            .is_some());
    }

    #[test]
    fn test_pattern_uses_configured_prefix() {
        let matcher = PatternMatcher::new("/snippets/:id", "@");
        let params = matcher.matches(&request(Method::GET, "/snippets/12")).unwrap();
        assert_eq!(params.get("@id"), Some("12"));
        assert_eq!(params.get(":id"), None);
    }

    #[test]
    fn test_pattern_requires_full_path() {
        let matcher = PatternMatcher::new("/snippets", ":");
        assert!(matcher.matches(&request(Method::GET, "/snippets")).is_some());
        assert!(matcher.matches(&request(Method::GET, "/snippets/")).is_some());
        assert!(matcher.matches(&request(Method::GET, "/snippets/1")).is_none());
        assert!(matcher.matches(&request(Method::GET, "/")).is_none());

        let root = PatternMatcher::new("/", ":");
        assert!(root.matches(&request(Method::GET, "/")).is_some());
        assert!(root.matches(&request(Method::GET, "/x")).is_none());
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/"), "/");
        assert_eq!(join_paths("/sub/", "/"), "/sub");
        assert_eq!(join_paths("/api", "users/:id/"), "/api/users/:id");
        assert_eq!(PathPattern::new("//a//b/", ":").as_str(), "/a/b");
    }

    #[derive(Debug)]
    struct Provider(&'static str, Vec<Arc<dyn Matcher>>);

    impl MatcherProvider for Provider {
        fn matchers(&self) -> &[Arc<dyn Matcher>] {
            &self.1
        }
    }

    #[test]
    fn test_request_matcher_first_full_match_wins() {
        let providers = vec![
            Provider(
                "post-only",
                vec![Arc::new(MethodMatcher::new([Method::POST])), Arc::new(PatternMatcher::new("/a/:x", ":"))],
            ),
            Provider("first", vec![Arc::new(PatternMatcher::new("/a/:x", ":"))]),
            Provider("second", vec![Arc::new(PatternMatcher::new("/a/b", ":"))]),
        ];
        let matcher = RequestMatcher::new(&providers);

        let (provider, params) = matcher.find(&request(Method::GET, "/a/b")).unwrap();
        assert_eq!(provider.0, "first");
        assert_eq!(params.get(":x"), Some("b"));

        assert!(matcher.find(&request(Method::GET, "/nowhere")).is_none());
    }
}
