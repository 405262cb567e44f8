//! # API Entities — Parameters, Bodies, Responses, Operations
//!
//! The named entities a definitions registry owns besides schemas.
//! These are plain immutable data carriers; the document crate projects
//! them into version-specific shapes. Operations go through
//! [`OperationBuilder`], which enforces unique response status keys and
//! the path-parameter-is-required rule.

use indexmap::IndexMap;
use serde_json::Value;

use aperio_core::{DefinitionError, Status};

use crate::schema::Schema;

/// Where a parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// A path template segment.
    Path,
    /// A cookie.
    Cookie,
}

impl ParameterLocation {
    /// The document identifier (`"query"`, `"header"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Cookie => "cookie",
        }
    }
}

/// A named request parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// The parameter name.
    pub name: String,
    /// Where the parameter is carried.
    pub location: ParameterLocation,
    /// The schema governing the parameter value.
    pub schema: Schema,
    /// Whether the parameter must be supplied. Path parameters are
    /// always required.
    pub required: bool,
    /// Human-readable description.
    pub description: Option<String>,
    /// Whether the parameter is deprecated.
    pub deprecated: bool,
    /// Whether an empty value is acceptable (query parameters only).
    pub allow_empty_value: bool,
    /// Vendor extension pairs.
    pub extensions: IndexMap<String, Value>,
}

impl Parameter {
    /// A parameter at the given location. Path parameters are forced
    /// required; everything else defaults to optional.
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: Schema) -> Self {
        Self {
            name: name.into(),
            location,
            schema,
            required: location == ParameterLocation::Path,
            description: None,
            deprecated: false,
            allow_empty_value: false,
            extensions: IndexMap::new(),
        }
    }

    /// Mark the parameter required. Ignored (already required) for
    /// path parameters.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Attach a vendor extension pair.
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// One declared content entry of a request body or response.
#[derive(Debug, Clone)]
pub struct MediaTypeObject {
    /// The schema for payloads of this media type.
    pub schema: Schema,
    /// An inline example value.
    pub example: Option<Value>,
    /// Names of registered example entities.
    pub example_refs: Vec<String>,
}

impl MediaTypeObject {
    /// A content entry governed by the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            example: None,
            example_refs: Vec::new(),
        }
    }

    /// Set the inline example.
    pub fn example(mut self, value: Value) -> Self {
        self.example = Some(value);
        self
    }

    /// Reference a registered example entity by name.
    pub fn example_ref(mut self, name: impl Into<String>) -> Self {
        self.example_refs.push(name.into());
        self
    }
}

/// A request body with one or more declared content types.
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    /// Human-readable description.
    pub description: Option<String>,
    /// Whether a body must be supplied.
    pub required: bool,
    /// Declared contents, keyed by media type, in declaration order.
    pub contents: IndexMap<String, MediaTypeObject>,
}

impl RequestBody {
    /// An empty request body declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a content entry for a media type.
    pub fn content(mut self, media_type: impl Into<String>, object: MediaTypeObject) -> Self {
        self.contents.insert(media_type.into(), object);
        self
    }

    /// Mark the body required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// A declared response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Human-readable description (mandatory in every dialect).
    pub description: String,
    /// Response headers, keyed by header name.
    pub headers: IndexMap<String, Schema>,
    /// Declared contents, keyed by media type, in declaration order.
    pub contents: IndexMap<String, MediaTypeObject>,
    /// Links to related operations, keyed by link name.
    pub links: IndexMap<String, Link>,
}

impl Response {
    /// A response with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            headers: IndexMap::new(),
            contents: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Declare a content entry for a media type.
    pub fn content(mut self, media_type: impl Into<String>, object: MediaTypeObject) -> Self {
        self.contents.insert(media_type.into(), object);
        self
    }

    /// Declare a response header.
    pub fn header(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.headers.insert(name.into(), schema);
        self
    }

    /// Declare a link to a related operation.
    pub fn link(mut self, name: impl Into<String>, link: Link) -> Self {
        self.links.insert(name.into(), link);
        self
    }
}

/// A reusable example entity.
#[derive(Debug, Clone, Default)]
pub struct ExampleObject {
    /// Short summary.
    pub summary: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// The example value itself.
    pub value: Option<Value>,
    /// A URI pointing at an external example, mutually exclusive with
    /// `value`.
    pub external_value: Option<String>,
}

impl ExampleObject {
    /// An example carrying the given value.
    pub fn of(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Set the summary.
    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }
}

/// The HTTP authentication scheme of an `http`-type security scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpScheme {
    /// Basic authentication.
    Basic,
    /// Bearer-token authentication.
    Bearer,
}

/// A declared security scheme. Only its document shape matters here;
/// credential verification happens outside the toolkit.
#[derive(Debug, Clone)]
pub enum SecurityScheme {
    /// A key carried in a query parameter, header, or cookie.
    ApiKey {
        /// The parameter/header/cookie name.
        name: String,
        /// Where the key is carried.
        location: ParameterLocation,
    },
    /// HTTP authentication.
    Http {
        /// The HTTP auth scheme.
        scheme: HttpScheme,
        /// A hint for the bearer token format (e.g. "JWT").
        bearer_format: Option<String>,
    },
}

/// One substitutable variable of a server URL template.
#[derive(Debug, Clone)]
pub struct ServerVariable {
    /// The default substitution.
    pub default: String,
    /// Allowed substitutions, if closed.
    pub enumeration: Vec<String>,
    /// Human-readable description.
    pub description: Option<String>,
}

/// A server the API is reachable on.
#[derive(Debug, Clone)]
pub struct Server {
    /// The server URL, possibly templated.
    pub url: String,
    /// A stable server name (rendered only by the newest dialect).
    pub name: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// URL template variables.
    pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
    /// A server at the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            description: None,
            variables: IndexMap::new(),
        }
    }

    /// Set the server name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A design-time link from a response to a related operation.
#[derive(Debug, Clone)]
pub struct Link {
    /// A stable link name (rendered only by the newest dialect).
    pub name: Option<String>,
    /// The target operation's id.
    pub operation_id: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Parameter expressions passed to the target operation.
    pub parameters: IndexMap<String, Value>,
}

impl Link {
    /// A link targeting the given operation id.
    pub fn to(operation_id: impl Into<String>) -> Self {
        Self {
            name: None,
            operation_id: operation_id.into(),
            description: None,
            parameters: IndexMap::new(),
        }
    }
}

/// An HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET.
    Get,
    /// PUT.
    Put,
    /// POST.
    Post,
    /// DELETE.
    Delete,
    /// OPTIONS.
    Options,
    /// HEAD.
    Head,
    /// PATCH.
    Patch,
    /// TRACE.
    Trace,
}

impl Method {
    /// The lowercase document identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

/// A parameter attached to an operation: registered by name, or inline.
#[derive(Debug, Clone)]
pub enum ParameterRef {
    /// A name registered in the definitions registry.
    Named(String),
    /// An inline parameter declaration.
    Inline(Box<Parameter>),
}

/// A request body attached to an operation: registered by name, or inline.
#[derive(Debug, Clone)]
pub enum RequestBodyRef {
    /// A name registered in the definitions registry.
    Named(String),
    /// An inline request body declaration.
    Inline(Box<RequestBody>),
}

/// A response attached to an operation: registered by name, or inline.
#[derive(Debug, Clone)]
pub enum ResponseRef {
    /// A name registered in the definitions registry.
    Named(String),
    /// An inline response declaration.
    Inline(Box<Response>),
}

/// One API operation: a method on a path with its parameters, body,
/// and status-keyed responses.
#[derive(Debug, Clone)]
pub struct Operation {
    /// The HTTP method.
    pub method: Method,
    /// The path template (e.g. `/pets/{id}`).
    pub path: String,
    /// The operation id, unique within the registry when set.
    pub operation_id: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Grouping tags.
    pub tags: Vec<String>,
    /// Whether the operation is deprecated.
    pub deprecated: bool,
    /// Declared parameters, in declaration order.
    pub parameters: Vec<ParameterRef>,
    /// The request body, if any.
    pub request_body: Option<RequestBodyRef>,
    /// Declared responses, keyed by status.
    pub responses: Vec<(Status, ResponseRef)>,
    /// Names of required security schemes (any-of semantics).
    pub security: Vec<String>,
    /// Operation-level server overrides.
    pub servers: Vec<Server>,
    /// Vendor extension pairs.
    pub extensions: IndexMap<String, Value>,
}

/// By-value builder for [`Operation`].
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    operation: Operation,
}

impl Operation {
    /// Start building an operation for the given method and path.
    pub fn builder(method: Method, path: impl Into<String>) -> OperationBuilder {
        OperationBuilder {
            operation: Operation {
                method,
                path: path.into(),
                operation_id: None,
                summary: None,
                description: None,
                tags: Vec::new(),
                deprecated: false,
                parameters: Vec::new(),
                request_body: None,
                responses: Vec::new(),
                security: Vec::new(),
                servers: Vec::new(),
                extensions: IndexMap::new(),
            },
        }
    }

    /// Declared response statuses in match-priority order (most
    /// specific first).
    pub fn statuses_by_priority(&self) -> Vec<&(Status, ResponseRef)> {
        let mut declared: Vec<&(Status, ResponseRef)> = self.responses.iter().collect();
        declared.sort_by(|a, b| a.0.cmp(&b.0));
        declared
    }

    /// Select the declared response for a concrete status code,
    /// preferring the most specific declaration.
    pub fn response_for(&self, code: u16) -> Option<&ResponseRef> {
        let selected = Status::select(self.responses.iter().map(|(s, _)| s), code)?;
        self.responses
            .iter()
            .find(|(s, _)| s == selected)
            .map(|(_, r)| r)
    }
}

impl OperationBuilder {
    /// Set the operation id.
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation.operation_id = Some(id.into());
        self
    }

    /// Set the summary.
    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.operation.summary = Some(text.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.operation.description = Some(text.into());
        self
    }

    /// Add a grouping tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.operation.tags.push(tag.into());
        self
    }

    /// Mark the operation deprecated.
    pub fn deprecated(mut self) -> Self {
        self.operation.deprecated = true;
        self
    }

    /// Attach an inline parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.operation
            .parameters
            .push(ParameterRef::Inline(Box::new(parameter)));
        self
    }

    /// Attach a registered parameter by name.
    pub fn parameter_ref(mut self, name: impl Into<String>) -> Self {
        self.operation.parameters.push(ParameterRef::Named(name.into()));
        self
    }

    /// Attach an inline request body.
    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.operation.request_body = Some(RequestBodyRef::Inline(Box::new(body)));
        self
    }

    /// Attach a registered request body by name.
    pub fn request_body_ref(mut self, name: impl Into<String>) -> Self {
        self.operation.request_body = Some(RequestBodyRef::Named(name.into()));
        self
    }

    /// Declare an inline response for a status.
    pub fn response(mut self, status: Status, response: Response) -> Self {
        self.operation
            .responses
            .push((status, ResponseRef::Inline(Box::new(response))));
        self
    }

    /// Declare a registered response by name for a status.
    pub fn response_ref(mut self, status: Status, name: impl Into<String>) -> Self {
        self.operation
            .responses
            .push((status, ResponseRef::Named(name.into())));
        self
    }

    /// Require a registered security scheme by name.
    pub fn security(mut self, scheme_name: impl Into<String>) -> Self {
        self.operation.security.push(scheme_name.into());
        self
    }

    /// Add an operation-level server override.
    pub fn server(mut self, server: Server) -> Self {
        self.operation.servers.push(server);
        self
    }

    /// Attach a vendor extension pair.
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.operation.extensions.insert(key.into(), value);
        self
    }

    /// Validate and produce the immutable operation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if two responses are declared for the
    /// same status key.
    pub fn build(self) -> Result<Operation, DefinitionError> {
        let mut seen: Vec<&Status> = Vec::new();
        for (status, _) in &self.operation.responses {
            if seen.contains(&status) {
                return Err(DefinitionError::InvalidArgument {
                    reason: format!(
                        "duplicate response status {status} on {} {}",
                        self.operation.method.as_str(),
                        self.operation.path
                    ),
                });
            }
            seen.push(status);
        }
        Ok(self.operation)
    }
}
