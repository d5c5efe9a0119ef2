//! Error types with rich diagnostics using miette
//!
//! Script errors carry the offending line as source code and a span over the
//! offending token, so a host can render them with miette's fancy reporter.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Coarse classification of a [`ScriptError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed verb, pattern, geometry or string
    Syntax,
    /// Unknown name, dangling link endpoint, undefined colour, empty regex match
    Reference,
    /// Bad arity or type, unknown flag, illegal operation on an object
    Argument,
    /// Missing asset file
    Resource,
    /// Layout delegate failure or unparsable output
    ExternalTool,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Reference => "reference",
            ErrorKind::Argument => "argument",
            ErrorKind::Resource => "resource",
            ErrorKind::ExternalTool => "external-tool",
        }
    }
}

// ============================================================================
// Script Errors
// ============================================================================

/// An error raised while executing one statement of a script
#[derive(Error, Diagnostic, Debug)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    #[diagnostic(code(cellx::syntax))]
    Syntax {
        line: usize,
        text: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(code(cellx::reference))]
    Reference {
        line: usize,
        text: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not found")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(code(cellx::argument))]
    Argument {
        line: usize,
        text: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid argument")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(code(cellx::resource))]
    Resource {
        line: usize,
        text: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("no such file")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(
        code(cellx::external_tool),
        help("the layout tool must read a DOT graph on stdin and print positions on stdout")
    )]
    ExternalTool {
        line: usize,
        text: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("while running this")]
        span: SourceSpan,
    },
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptError::Syntax { .. } => ErrorKind::Syntax,
            ScriptError::Reference { .. } => ErrorKind::Reference,
            ScriptError::Argument { .. } => ErrorKind::Argument,
            ScriptError::Resource { .. } => ErrorKind::Resource,
            ScriptError::ExternalTool { .. } => ErrorKind::ExternalTool,
        }
    }

    /// 1-based line number of the failing statement
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Syntax { line, .. }
            | ScriptError::Reference { line, .. }
            | ScriptError::Argument { line, .. }
            | ScriptError::Resource { line, .. }
            | ScriptError::ExternalTool { line, .. } => *line,
        }
    }

    /// Raw text of the failing line
    pub fn text(&self) -> &str {
        match self {
            ScriptError::Syntax { text, .. }
            | ScriptError::Reference { text, .. }
            | ScriptError::Argument { text, .. }
            | ScriptError::Resource { text, .. }
            | ScriptError::ExternalTool { text, .. } => text,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ScriptError::Syntax { message, .. }
            | ScriptError::Reference { message, .. }
            | ScriptError::Argument { message, .. }
            | ScriptError::Resource { message, .. }
            | ScriptError::ExternalTool { message, .. } => message,
        }
    }
}

/// Where a statement came from; turns lower-level failures into diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub name: &'a str,
    pub line: usize,
    pub text: &'a str,
}

impl<'a> LineContext<'a> {
    pub fn new(name: &'a str, line: usize, text: &'a str) -> Self {
        Self { name, line, text }
    }

    /// Span of the first occurrence of `token` in the line, or the whole line.
    fn span_of(&self, token: Option<&str>) -> SourceSpan {
        token
            .filter(|t| !t.is_empty())
            .and_then(|t| self.text.find(t).map(|at| (at, t.len()).into()))
            .unwrap_or_else(|| (0, self.text.len()).into())
    }

    pub fn error(&self, kind: ErrorKind, message: impl Into<String>, token: Option<&str>) -> ScriptError {
        let line = self.line;
        let text = self.text.to_string();
        let message = message.into();
        let src = NamedSource::new(format!("{}:{}", self.name, line), text.clone());
        let span = self.span_of(token);
        match kind {
            ErrorKind::Syntax => ScriptError::Syntax { line, text, message, src, span },
            ErrorKind::Reference => ScriptError::Reference { line, text, message, src, span },
            ErrorKind::Argument => ScriptError::Argument { line, text, message, src, span },
            ErrorKind::Resource => ScriptError::Resource { line, text, message, src, span },
            ErrorKind::ExternalTool => ScriptError::ExternalTool { line, text, message, src, span },
        }
    }

    pub fn syntax(&self, message: impl Into<String>, token: &str) -> ScriptError {
        self.error(ErrorKind::Syntax, message, Some(token))
    }

    pub fn reference(&self, message: impl Into<String>, token: &str) -> ScriptError {
        self.error(ErrorKind::Reference, message, Some(token))
    }

    pub fn argument(&self, message: impl Into<String>, token: Option<&str>) -> ScriptError {
        self.error(ErrorKind::Argument, message, token)
    }

    pub fn resource(&self, message: impl Into<String>, token: &str) -> ScriptError {
        self.error(ErrorKind::Resource, message, Some(token))
    }

    /// Lift a scene-graph failure into a script diagnostic.
    pub fn scene(&self, err: SceneError) -> ScriptError {
        let token = err.object_name().map(str::to_string);
        self.error(err.kind(), err.to_string(), token.as_deref())
    }

    pub fn layout(&self, err: LayoutError) -> ScriptError {
        match err {
            LayoutError::Scene(err) => self.scene(err),
            err => self.error(ErrorKind::ExternalTool, err.to_string(), None),
        }
    }

    /// Error with an explicit byte span, for grammar failures.
    pub fn error_at(&self, kind: ErrorKind, message: impl Into<String>, offset: usize, len: usize) -> ScriptError {
        let offset = offset.min(self.text.len());
        let len = len.min(self.text.len() - offset);
        let mut err = self.error(kind, message, None);
        match &mut err {
            ScriptError::Syntax { span, .. }
            | ScriptError::Reference { span, .. }
            | ScriptError::Argument { span, .. }
            | ScriptError::Resource { span, .. }
            | ScriptError::ExternalTool { span, .. } => *span = (offset, len).into(),
        }
        err
    }
}

// ============================================================================
// Scene Errors
// ============================================================================

/// Failures of scene-graph operations, independent of any script line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("object '{name}' not found")]
    UnknownObject { name: String },

    #[error("cannot move attached object '{name}'")]
    AttachedMove { name: String },

    #[error("cannot animate attached object '{name}'")]
    AttachedAnimate { name: String },

    #[error("cannot attach '{child}' to '{parent}': it would create a cycle")]
    AttachCycle { child: String, parent: String },

    #[error("no objects to fit")]
    NothingToFit,
}

impl SceneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SceneError::UnknownObject { .. } => ErrorKind::Reference,
            SceneError::AttachedMove { .. }
            | SceneError::AttachedAnimate { .. }
            | SceneError::AttachCycle { .. }
            | SceneError::NothingToFit => ErrorKind::Argument,
        }
    }

    fn object_name(&self) -> Option<&str> {
        match self {
            SceneError::UnknownObject { name }
            | SceneError::AttachedMove { name }
            | SceneError::AttachedAnimate { name } => Some(name),
            SceneError::AttachCycle { child, .. } => Some(child),
            SceneError::NothingToFit => None,
        }
    }
}

// ============================================================================
// Layout Errors
// ============================================================================

/// Failures of the force-directed layout delegate
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("cannot run layout tool '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("layout tool '{tool}' exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("layout tool output is not UTF-8")]
    NotUtf8,

    #[error("layout tool returned no position for '{name}'")]
    MissingNode { name: String },

    #[error("empty layout tool command")]
    EmptyCommand,

    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_points_at_token() {
        let ctx = LineContext::new("<script>", 4, "move b9 10 10");
        let err = ctx.reference("object 'b9' not found", "b9");
        assert_eq!(err.kind(), ErrorKind::Reference);
        assert_eq!(err.line(), 4);
        assert_eq!(err.text(), "move b9 10 10");
        let ScriptError::Reference { span, .. } = err else {
            panic!("expected a reference error");
        };
        assert_eq!(span.offset(), 5);
        assert_eq!(span.len(), 2);
    }

    #[test]
    fn scene_errors_keep_their_message() {
        let ctx = LineContext::new("<script>", 1, "move c 1 1");
        let err = ctx.scene(SceneError::AttachedMove { name: "c".into() });
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(err.to_string(), "line 1: cannot move attached object 'c'");
    }
}
