//! Route table: HTTP shapes bound to RPC methods.
//!
//! # Design Decisions
//! - Templates are parsed once at startup; the table is immutable after
//!   that and shared without locks
//! - Candidates are ordered by segment count, then by literal segment
//!   count, so the most specific template wins
//! - Method must match exactly; there is no fallthrough across methods
//! - No regex; matching is a segment walk

use axum::http::Method;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("empty path template")]
    Empty,

    #[error("template {template:?} must start with '/'")]
    MissingSlash { template: String },

    #[error("template {template:?} has a malformed segment {segment:?}")]
    BadSegment { template: String, segment: String },

    #[error("template {template:?} binds parameter {name:?} twice")]
    DuplicateParam { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/v1/widgets/{id}`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        if template.is_empty() {
            return Err(RouteError::Empty);
        }
        let rest = template.strip_prefix('/').ok_or_else(|| RouteError::MissingSlash {
            template: template.to_string(),
        })?;

        let mut segments = Vec::new();
        let mut params: Vec<&str> = Vec::new();
        for part in rest.split('/') {
            if part.is_empty() {
                return Err(RouteError::BadSegment {
                    template: template.to_string(),
                    segment: part.to_string(),
                });
            }
            if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if name.is_empty() {
                    return Err(RouteError::BadSegment {
                        template: template.to_string(),
                        segment: part.to_string(),
                    });
                }
                if params.contains(&name) {
                    return Err(RouteError::DuplicateParam {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                params.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else if part.contains('{') || part.contains('}') {
                return Err(RouteError::BadSegment {
                    template: template.to_string(),
                    segment: part.to_string(),
                });
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match a concrete request path, returning the bound parameters.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut bound = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    bound.push((name.clone(), (*part).to_string()));
                }
            }
        }
        Some(bound)
    }
}

/// How the request body maps onto the RPC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyMapping {
    /// No body is read (GET/DELETE style routes).
    None,
    /// The whole JSON body is the message (the `*` binding).
    Whole,
    /// The body becomes one named field of the message.
    Field(String),
}

/// One transcoding rule: an HTTP shape bound to an RPC method.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub method: Method,
    pub template: PathTemplate,
    pub service: String,
    pub rpc_method: String,
    pub body: BodyMapping,
}

impl RouteRule {
    pub fn new(
        method: Method,
        template: &str,
        service: &str,
        rpc_method: &str,
        body: BodyMapping,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            method,
            template: PathTemplate::parse(template)?,
            service: service.to_string(),
            rpc_method: rpc_method.to_string(),
            body,
        })
    }
}

/// Immutable, longest-match-first route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteRule>,
}

impl RouteTable {
    /// Order the rules most-specific-first and freeze them.
    pub fn build(mut routes: Vec<RouteRule>) -> Self {
        routes.sort_by(|a, b| {
            b.template
                .segment_count()
                .cmp(&a.template.segment_count())
                .then(b.template.literal_count().cmp(&a.template.literal_count()))
        });
        Self { routes }
    }

    /// Find the first rule matching method and path.
    pub fn matches(&self, method: &Method, path: &str) -> Option<(&RouteRule, Vec<(String, String)>)> {
        self.routes
            .iter()
            .filter(|rule| rule.method == *method)
            .find_map(|rule| rule.template.matches(path).map(|bound| (rule, bound)))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_literals_and_params() {
        let template = PathTemplate::parse("/v1/widgets/{id}/parts/{part}").unwrap();
        let bound = template.matches("/v1/widgets/42/parts/lid").unwrap();
        assert_eq!(
            bound,
            vec![
                ("id".to_string(), "42".to_string()),
                ("part".to_string(), "lid".to_string())
            ]
        );
    }

    #[test]
    fn template_rejects_bad_shapes() {
        assert!(PathTemplate::parse("").is_err());
        assert!(PathTemplate::parse("v1/widgets").is_err());
        assert!(PathTemplate::parse("/v1//widgets").is_err());
        assert!(PathTemplate::parse("/v1/{}").is_err());
        assert!(PathTemplate::parse("/v1/{id").is_err());
        assert!(PathTemplate::parse("/v1/{id}/{id}").is_err());
    }

    #[test]
    fn template_mismatches() {
        let template = PathTemplate::parse("/v1/widgets/{id}").unwrap();
        assert!(template.matches("/v1/widgets").is_none());
        assert!(template.matches("/v1/gadgets/42").is_none());
        assert!(template.matches("/v1/widgets/42/extra").is_none());
    }

    fn rule(method: Method, template: &str) -> RouteRule {
        RouteRule::new(method, template, "widgets.v1.WidgetService", "Get", BodyMapping::None)
            .unwrap()
    }

    #[test]
    fn longest_match_wins() {
        let table = RouteTable::build(vec![
            rule(Method::GET, "/v1/{name}"),
            rule(Method::GET, "/v1/widgets"),
        ]);

        // The all-literal template outranks the parameterized one.
        let (matched, bound) = table.matches(&Method::GET, "/v1/widgets").unwrap();
        assert_eq!(matched.template.raw(), "/v1/widgets");
        assert!(bound.is_empty());

        let (matched, bound) = table.matches(&Method::GET, "/v1/gadgets").unwrap();
        assert_eq!(matched.template.raw(), "/v1/{name}");
        assert_eq!(bound, vec![("name".to_string(), "gadgets".to_string())]);
    }

    #[test]
    fn deeper_templates_rank_first() {
        let table = RouteTable::build(vec![
            rule(Method::GET, "/v1/widgets"),
            rule(Method::GET, "/v1/widgets/{id}"),
        ]);
        let (matched, _) = table.matches(&Method::GET, "/v1/widgets/42").unwrap();
        assert_eq!(matched.template.raw(), "/v1/widgets/{id}");
    }

    #[test]
    fn method_must_match() {
        let table = RouteTable::build(vec![rule(Method::GET, "/v1/widgets")]);
        assert!(table.matches(&Method::POST, "/v1/widgets").is_none());
        assert!(table.matches(&Method::GET, "/v1/widgets").is_some());
    }
}
