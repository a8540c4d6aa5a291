//! Route matching logic.
//!
//! # Responsibilities
//! - Strip the context path prefix
//! - Match method (exact, case-sensitive) and path segments
//! - Consume `depth` segments for the namespace slot of repository routes
//! - Collect parameter bindings in pattern order
//!
//! # Design Decisions
//! - Method and literal matching are case-sensitive
//! - Trailing slashes are ignored; interior empty segments are not
//! - No regex: a single linear pass per candidate route
//! - No match is `None`, never an error

use axum::http::Method;

use crate::routing::route::{Params, Route, Segment, NAMESPACE_PARAM};

/// A matched route and the parameters bound while matching it.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: Params,
}

/// Find the first route (in registration order) matching `method` and `path`.
///
/// Segments are percent-decoded before matching; a segment that does not decode to UTF-8
/// matches nothing. Parameter spans index the segments of the full `path`.
pub fn match_route<'a>(
    routes: &'a [Route],
    method: &Method,
    path: &str,
    context_path: &str,
    depth: usize,
) -> Option<RouteMatch<'a>> {
    let rest = strip_context_path(path, context_path)?;
    let raw = split_segments(rest);
    let offset = split_segments(path).len().checked_sub(raw.len())?;
    let segments = raw
        .into_iter()
        .map(|segment| urlencoding::decode(segment).ok())
        .collect::<Option<Vec<_>>>()?;
    let segments: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();

    routes
        .iter()
        .filter(|route| route.method() == method)
        .find_map(|route| {
            match_segments(route.segments(), &segments, depth, offset).map(|params| RouteMatch { route, params })
        })
}

/// Remove `context_path` from the front of `path`, on a segment boundary.
fn strip_context_path<'p>(path: &'p str, context_path: &str) -> Option<&'p str> {
    let prefix = context_path.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn match_segments(pattern: &[Segment], segments: &[&str], depth: usize, offset: usize) -> Option<Params> {
    let mut params = Params::new();
    let mut cursor = 0;

    for segment in pattern {
        match segment {
            Segment::Literal(literal) => {
                if *segments.get(cursor)? != literal.as_str() {
                    return None;
                }
                cursor += 1;
            }
            Segment::Param(name) => {
                let value = segments.get(cursor)?;
                if value.is_empty() {
                    return None;
                }
                params.push_at(name.as_str(), *value, offset + cursor..offset + cursor + 1);
                cursor += 1;
            }
            Segment::Namespace => {
                if depth == 0 {
                    continue;
                }
                let end = cursor.checked_add(depth)?;
                let namespace = segments.get(cursor..end)?;
                if namespace.iter().any(|s| s.is_empty()) {
                    return None;
                }
                params.push_at(NAMESPACE_PARAM, namespace.join("/"), offset + cursor..offset + end);
                cursor = end;
            }
        }
    }

    (cursor == segments.len()).then_some(params)
}
