//! Route lookup.
//!
//! # Responsibilities
//! - Own the frozen route table
//! - Carry the deployment's context path and namespace depth
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in registration order (first match wins)

use axum::http::Method;

use crate::routing::matcher::{match_route, RouteMatch};
use crate::routing::route::RouteTable;

/// Frozen route table plus the path settings it is matched under.
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    context_path: String,
    depth: usize,
}

impl Router {
    pub fn new(table: RouteTable, context_path: impl Into<String>, depth: usize) -> Self {
        let context_path = context_path.into().trim_end_matches('/').to_string();
        tracing::debug!(
            routes = table.len(),
            context_path = %context_path,
            depth,
            "Route table frozen"
        );
        Self {
            table,
            context_path,
            depth,
        }
    }

    /// Look up the route for a request.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        match_route(self.table.routes(), method, path, &self.context_path, self.depth)
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}
