use livediff_core_types::{RequestContext, RequestId, TraceId};
use thiserror::Error;

/// Result type alias using the canonical structured error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling
/// and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    InvalidManifest,
    InvalidRevisionName,

    // Lookup
    NotFound,
    AlreadyExists,
    Conflict,
    DefinitionNotFound,

    // Policy expansion
    PolicyNotFound,
    InvalidPolicy,
    InvalidSelector,

    // Rendering
    RenderFailed,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::InvalidRevisionName => "ERR_INVALID_REVISION_NAME",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::DefinitionNotFound => "ERR_DEFINITION_NOT_FOUND",
            ExErrorKind::PolicyNotFound => "ERR_POLICY_NOT_FOUND",
            ExErrorKind::InvalidPolicy => "ERR_INVALID_POLICY",
            ExErrorKind::InvalidSelector => "ERR_INVALID_SELECTOR",
            ExErrorKind::RenderFailed => "ERR_RENDER_FAILED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the operation
/// stage and object name for humans. Wrapping errors keep the cause in
/// `source`, and `Display` renders the whole chain.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the name of the object the error is about
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attach the correlation ids of the invocation that failed
    pub fn with_context(self, ctx: &RequestContext) -> Self {
        let err = self.with_request_id(ctx.request_id.clone());
        match &ctx.trace_id {
            Some(trace_id) => err.with_trace_id(trace_id.clone()),
            None => err,
        }
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Wrap `self` as the source of a new error of the same kind
    ///
    /// Used to annotate a failure with the stage that observed it while
    /// keeping the original classification.
    pub fn wrap(self, op: impl Into<String>, message: impl Into<String>) -> Self {
        ExError::new(self.kind)
            .with_op(op)
            .with_message(message)
            .with_source(self)
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// True when this error, or any error it wraps, is a not-found lookup
    pub fn is_not_found(&self) -> bool {
        let mut current = Some(self);
        while let Some(err) = current {
            if err.kind == ExErrorKind::NotFound {
                return true;
            }
            current = err.source_error();
        }
        false
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures raised by rendering, policy expansion and diffing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiveDiffError {
    // ===== Lookup =====
    /// A cluster object could not be found
    #[error("{resource} \"{name}\" not found")]
    ObjectNotFound { resource: String, name: String },

    /// A component/trait/policy definition could not be resolved
    #[error("{kind} definition \"{name}\" not found")]
    DefinitionNotFound { kind: String, name: String },

    /// An object with the same key already exists
    #[error("{resource} \"{name}\" already exists")]
    AlreadyExists { resource: String, name: String },

    /// Optimistic concurrency check failed on update
    #[error("{resource} \"{name}\" has been modified: expected resourceVersion {expected}, found {actual}")]
    Conflict {
        resource: String,
        name: String,
        expected: String,
        actual: String,
    },

    // ===== Policy expansion =====
    /// A deploy step referenced a policy that is not declared
    #[error("policy {name} not found")]
    PolicyNotFound { name: String },

    /// Policy other than debug declared without properties
    #[error("policy {policy_type} named {name} must not have empty properties")]
    EmptyPolicyProperties { policy_type: String, name: String },

    /// Override policy without properties
    #[error("override policy {name} must not have empty properties")]
    EmptyOverridePolicy { name: String },

    /// Override policy properties failed strict parsing
    #[error("failed to parse override policy {name}: {reason}")]
    InvalidOverridePolicy { name: String, reason: String },

    /// Applying the override patches failed
    #[error("failed to apply override policy {name}: {reason}")]
    OverrideFailed { name: String, reason: String },

    /// Deploy step properties failed strict parsing
    #[error("invalid properties for deploy step {step}: {reason}")]
    InvalidDeployStep { step: String, reason: String },

    /// Component name pattern in an override patch is not a valid regex
    #[error("invalid component name pattern {pattern}: {reason}")]
    InvalidComponentPattern { pattern: String, reason: String },

    // ===== Rendering =====
    /// A template referenced a value that is not provided
    #[error("template of {owner} references undefined value {path}")]
    UndefinedTemplateValue { owner: String, path: String },

    /// A rendered template did not produce an object
    #[error("template of {owner} must render an object")]
    TemplateNotObject { owner: String },

    /// Properties of a built-in component type failed parsing
    #[error("invalid properties for {component_type} in component {component}: {reason}")]
    InvalidComponentProperties {
        component_type: String,
        component: String,
        reason: String,
    },

    /// Revision name carries no revision suffix
    #[error("revision name {name} has no revision suffix")]
    InvalidRevisionName { name: String },

    // ===== Input/output =====
    /// Input document is not a valid manifest
    #[error("invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    /// Serialization failure
    #[error("serialization failed: {reason}")]
    Serialization { reason: String },

    /// File or sink failure
    #[error("io failure on {target}: {reason}")]
    Io { target: String, reason: String },

    /// Catch-all for invariant breaks
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl From<LiveDiffError> for ExError {
    fn from(err: LiveDiffError) -> Self {
        let (kind, entity_id) = match &err {
            LiveDiffError::ObjectNotFound { name, .. } => (ExErrorKind::NotFound, Some(name)),
            LiveDiffError::DefinitionNotFound { name, .. } => {
                (ExErrorKind::DefinitionNotFound, Some(name))
            }
            LiveDiffError::AlreadyExists { name, .. } => (ExErrorKind::AlreadyExists, Some(name)),
            LiveDiffError::Conflict { name, .. } => (ExErrorKind::Conflict, Some(name)),
            LiveDiffError::PolicyNotFound { name } => (ExErrorKind::PolicyNotFound, Some(name)),
            LiveDiffError::EmptyPolicyProperties { name, .. }
            | LiveDiffError::EmptyOverridePolicy { name }
            | LiveDiffError::InvalidOverridePolicy { name, .. }
            | LiveDiffError::OverrideFailed { name, .. } => {
                (ExErrorKind::InvalidPolicy, Some(name))
            }
            LiveDiffError::InvalidDeployStep { step, .. } => {
                (ExErrorKind::InvalidPolicy, Some(step))
            }
            LiveDiffError::InvalidComponentPattern { pattern, .. } => {
                (ExErrorKind::InvalidSelector, Some(pattern))
            }
            LiveDiffError::UndefinedTemplateValue { owner, .. }
            | LiveDiffError::TemplateNotObject { owner } => {
                (ExErrorKind::RenderFailed, Some(owner))
            }
            LiveDiffError::InvalidComponentProperties { component, .. } => {
                (ExErrorKind::InvalidInput, Some(component))
            }
            LiveDiffError::InvalidRevisionName { name } => {
                (ExErrorKind::InvalidRevisionName, Some(name))
            }
            LiveDiffError::InvalidManifest { .. } => (ExErrorKind::InvalidManifest, None),
            LiveDiffError::Serialization { .. } => (ExErrorKind::Serialization, None),
            LiveDiffError::Io { target, .. } => (ExErrorKind::Io, Some(target)),
            LiveDiffError::Internal { .. } => (ExErrorKind::Internal, None),
        };

        let mut ex = ExError::new(kind).with_message(err.to_string());
        if let Some(id) = entity_id {
            ex = ex.with_entity_id(id.clone());
        }
        ex
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

impl From<serde_yaml::Error> for ExError {
    fn from(err: serde_yaml::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
