//! Request validation.
//!
//! Schema-checks up to three independent request sections — body, path
//! params, query — before the handler runs. Sections are validated in that
//! order and the first failing section short-circuits with a 400; later
//! sections are not inspected.
//!
//! On success each raw section is replaced by the schema's normalized
//! output: declared integers/numbers/booleans arriving as strings (path
//! params and query values always do) are coerced, and undeclared fields
//! are stripped. Handlers therefore consume typed data, never raw strings.
//!
//! The client receives only the first issue message; the full issue set is
//! logged at warn for operators.

use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Outcome};
use crate::types::{Request, Response, ResponseExt};
use palisade_core::{envelope, HttpError};

/// Expected type of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any string.
    String,
    /// An integer, coercible from a numeric string.
    Integer,
    /// A float, coercible from a numeric string.
    Number,
    /// A boolean, coercible from `"true"` / `"false"`.
    Boolean,
    /// A string in email shape.
    Email,
    /// A string in UUID shape.
    Uuid,
}

impl FieldKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Email => "a valid email address",
            Self::Uuid => "a valid UUID",
        }
    }
}

/// Declaration of one field in a [`Schema`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    kind: FieldKind,
    required: bool,
    min_len: Option<usize>,
}

impl FieldSpec {
    /// A required field of the given kind.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            min_len: None,
        }
    }

    /// Required string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// Required integer field.
    #[must_use]
    pub const fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    /// Required number field.
    #[must_use]
    pub const fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    /// Required boolean field.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// Required email field.
    #[must_use]
    pub const fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    /// Required UUID field.
    #[must_use]
    pub const fn uuid() -> Self {
        Self::new(FieldKind::Uuid)
    }

    /// Marks the field optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Requires a minimum string length.
    #[must_use]
    pub const fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// The field path that failed.
    pub field: String,
    /// Human-readable failure message.
    pub message: String,
}

impl Issue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A declarative schema over a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
    allow_additional: bool,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Keeps undeclared fields instead of stripping them.
    #[must_use]
    pub const fn allow_additional(mut self) -> Self {
        self.allow_additional = true;
        self
    }

    /// Validates `value`, returning the normalized object or every issue.
    pub fn validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let empty = Map::new();
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null => &empty,
            _ => {
                return Err(vec![Issue::new("", "must be an object")]);
            }
        };

        let mut issues = Vec::new();
        let mut normalized = Map::new();

        for (name, spec) in &self.fields {
            match obj.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        issues.push(Issue::new(
                            name.clone(),
                            format!("Missing required field: {name}"),
                        ));
                    }
                }
                Some(raw) => match Self::check_field(name, spec, raw) {
                    Ok(coerced) => {
                        normalized.insert(name.clone(), coerced);
                    }
                    Err(issue) => issues.push(issue),
                },
            }
        }

        if self.allow_additional {
            let declared: Vec<&str> = self.fields.iter().map(|(n, _)| n.as_str()).collect();
            for (name, raw) in obj {
                if !declared.contains(&name.as_str()) {
                    normalized.insert(name.clone(), raw.clone());
                }
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(normalized))
        } else {
            Err(issues)
        }
    }

    /// Checks one field, returning the coerced value.
    fn check_field(name: &str, spec: &FieldSpec, raw: &Value) -> Result<Value, Issue> {
        let type_issue = || Issue::new(name, format!("{name} must be {}", spec.kind.describe()));

        let coerced = match spec.kind {
            FieldKind::String | FieldKind::Email | FieldKind::Uuid => match raw {
                Value::String(s) => Value::String(s.clone()),
                _ => return Err(type_issue()),
            },
            FieldKind::Integer => match raw {
                Value::Number(n) if n.is_i64() || n.is_u64() => raw.clone(),
                Value::String(s) => match s.trim().parse::<i64>() {
                    Ok(n) => Value::from(n),
                    Err(_) => return Err(type_issue()),
                },
                _ => return Err(type_issue()),
            },
            FieldKind::Number => match raw {
                Value::Number(_) => raw.clone(),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(n) => serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .ok_or_else(type_issue)?,
                    Err(_) => return Err(type_issue()),
                },
                _ => return Err(type_issue()),
            },
            FieldKind::Boolean => match raw {
                Value::Bool(_) => raw.clone(),
                Value::String(s) => match s.trim() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => return Err(type_issue()),
                },
                _ => return Err(type_issue()),
            },
        };

        if let Value::String(s) = &coerced {
            match spec.kind {
                FieldKind::Email if !is_valid_email(s) => return Err(type_issue()),
                FieldKind::Uuid if Uuid::parse_str(s).is_err() => return Err(type_issue()),
                _ => {}
            }
            if let Some(min) = spec.min_len {
                if s.chars().count() < min {
                    return Err(Issue::new(
                        name,
                        format!("{name} must be at least {min} characters"),
                    ));
                }
            }
        }

        Ok(coerced)
    }
}

/// Minimal email shape check: non-empty local part, dotted domain.
fn is_valid_email(s: &str) -> bool {
    if s.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// The three independently schemed request sections, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// JSON request body.
    Body,
    /// Path parameters extracted by the router.
    Params,
    /// Query-string parameters.
    Query,
}

impl Section {
    /// Wire name used in the client-facing message.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Params => "params",
            Self::Query => "query",
        }
    }
}

/// Stage validating configured sections before the handler runs.
#[derive(Debug, Clone, Default)]
pub struct ValidationStage {
    body: Option<Schema>,
    params: Option<Schema>,
    query: Option<Schema>,
}

impl ValidationStage {
    /// Creates a stage with no schemas (validates nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body schema.
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// Sets the path-params schema.
    #[must_use]
    pub fn params(mut self, schema: Schema) -> Self {
        self.params = Some(schema);
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Builds the 400 response for a failed section.
    fn reject(request: &Request, section: Section, issues: &[Issue]) -> Outcome {
        warn!(
            section = section.as_str(),
            path = %request.uri().path(),
            issues = ?issues,
            "request validation failed"
        );

        let first = issues
            .first()
            .map_or("validation failed", |i| i.message.as_str());
        let err = HttpError::bad_request(format!(
            "Invalid request {}: {first}",
            section.as_str()
        ));
        Outcome::Respond(Response::from_envelope(&envelope::from_http_error(&err)))
    }

    /// Parses the query string into an object of raw strings.
    fn query_value(request: &Request) -> Value {
        let mut map = Map::new();
        if let Some(query) = request.uri().query() {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        Value::Object(map)
    }

    /// Path params as an object of raw strings.
    fn params_value(ctx: &RequestContext) -> Value {
        let map: Map<String, Value> = ctx
            .path_params()
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

impl Middleware for ValidationStage {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            // Body first: read the (already-buffered) bytes, then rebuild
            // the request for downstream consumers.
            let request = if let Some(schema) = &self.body {
                use http_body_util::BodyExt;

                let (parts, body) = request.into_parts();
                let bytes = match body.collect().await {
                    Ok(collected) => collected.to_bytes(),
                    Err(_) => bytes::Bytes::new(),
                };

                let raw: Value = if bytes.is_empty() {
                    Value::Object(Map::new())
                } else {
                    match serde_json::from_slice(&bytes) {
                        Ok(value) => value,
                        Err(_) => {
                            let request = Request::from_parts(parts, http_body_util::Full::new(bytes));
                            let issues = vec![Issue::new("", "body must be valid JSON")];
                            return Self::reject(&request, Section::Body, &issues);
                        }
                    }
                };

                let request = Request::from_parts(parts, http_body_util::Full::new(bytes));
                match schema.validate(&raw) {
                    Ok(normalized) => {
                        ctx.validated_mut().body = Some(normalized);
                        request
                    }
                    Err(issues) => return Self::reject(&request, Section::Body, &issues),
                }
            } else {
                request
            };

            if let Some(schema) = &self.params {
                match schema.validate(&Self::params_value(ctx)) {
                    Ok(normalized) => ctx.validated_mut().params = Some(normalized),
                    Err(issues) => return Self::reject(&request, Section::Params, &issues),
                }
            }

            if let Some(schema) = &self.query {
                match schema.validate(&Self::query_value(&request)) {
                    Ok(normalized) => ctx.validated_mut().query = Some(normalized),
                    Err(issues) => return Self::reject(&request, Section::Query, &issues),
                }
            }

            Outcome::Continue(request)
        })
    }
}
