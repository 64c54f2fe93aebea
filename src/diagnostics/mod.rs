use crate::span::Span;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Long-form explanation codes attached to the most common diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Explainer {
    IncorrectTypeInLetAssignment,
    IncorrectRightHandTypeInAssignment,
}

impl Explainer {
    pub fn code(self) -> &'static str {
        match self {
            Explainer::IncorrectTypeInLetAssignment => "E0001",
            Explainer::IncorrectRightHandTypeInAssignment => "E0002",
        }
    }

    pub fn explain(self) -> &'static str {
        match self {
            Explainer::IncorrectTypeInLetAssignment => {
                "the value on the right of `=` must have the type written after `:` in a `let`"
            }
            Explainer::IncorrectRightHandTypeInAssignment => {
                "an assignment must store a value of the variable's declared type"
            }
        }
    }
}

/// Optional extras carried by a span-bound diagnostic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notes {
    pub hint: Option<String>,
    pub secondary: Option<(Span, String)>,
    pub code: Option<Explainer>,
}

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("Parse error: {msg}")]
    Parse { msg: String, span: Span, notes: Box<Notes> },

    #[error("Type error: {msg}")]
    Type { msg: String, span: Span, notes: Box<Notes> },

    #[error("Declaration error: {msg}")]
    Declaration { msg: String, span: Span, notes: Box<Notes> },

    #[error("I/O error: {msg}")]
    Io { msg: String, path: PathBuf },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("Internal compiler error: {msg}")]
    Internal { msg: String },
}

impl CompileError {
    pub fn parse(msg: impl Into<String>, span: Span) -> Self {
        Self::Parse { msg: msg.into(), span, notes: Box::default() }
    }

    pub fn type_err(msg: impl Into<String>, span: Span) -> Self {
        Self::Type { msg: msg.into(), span, notes: Box::default() }
    }

    pub fn declaration(msg: impl Into<String>, span: Span) -> Self {
        Self::Declaration { msg: msg.into(), span, notes: Box::default() }
    }

    pub fn io(msg: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Io { msg: msg.into(), path: path.into() }
    }

    pub fn config(msg: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config { msg: msg.into(), path: path.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { msg: msg.into() }
    }

    /// `expected X, found Y` type error in the house format.
    pub fn mismatch(what: &str, expected: impl std::fmt::Display, found: impl std::fmt::Display, span: Span) -> Self {
        Self::type_err(format!("{what}: expected `{expected}`, found `{found}`"), span)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        if let Some(notes) = self.notes_mut() {
            notes.hint = Some(hint.into());
        }
        self
    }

    pub fn with_secondary(mut self, span: Span, label: impl Into<String>) -> Self {
        if let Some(notes) = self.notes_mut() {
            notes.secondary = Some((span, label.into()));
        }
        self
    }

    pub fn with_code(mut self, code: Explainer) -> Self {
        if let Some(notes) = self.notes_mut() {
            notes.code = Some(code);
        }
        self
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Parse { span, .. } | Self::Type { span, .. } | Self::Declaration { span, .. } => Some(span),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Parse { msg, .. }
            | Self::Type { msg, .. }
            | Self::Declaration { msg, .. }
            | Self::Io { msg, .. }
            | Self::Config { msg, .. }
            | Self::Internal { msg } => msg,
        }
    }

    pub fn notes(&self) -> Option<&Notes> {
        match self {
            Self::Parse { notes, .. } | Self::Type { notes, .. } | Self::Declaration { notes, .. } => Some(notes),
            _ => None,
        }
    }

    fn notes_mut(&mut self) -> Option<&mut Notes> {
        match self {
            Self::Parse { notes, .. } | Self::Type { notes, .. } | Self::Declaration { notes, .. } => Some(notes),
            _ => None,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Type { .. } => "type",
            Self::Declaration { .. } => "declaration",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Receives the error that aborted a compilation run.
pub trait DiagnosticSink {
    fn report(&mut self, err: &CompileError);
}

/// Renders diagnostics to stderr with ariadne.
#[derive(Debug, Default)]
pub struct TerminalSink {
    pub color: bool,
}

impl DiagnosticSink for TerminalSink {
    fn report(&mut self, err: &CompileError) {
        let stderr = io::stderr();
        if render_error(err, &mut stderr.lock(), self.color).is_err() {
            eprintln!("error [{}]: {err}", err.category());
        }
    }
}

/// Keeps reported errors for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub errors: Vec<CompileError>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, err: &CompileError) {
        self.errors.push(err.clone());
    }
}

/// Render a CompileError with ariadne.
pub fn render_error(err: &CompileError, out: &mut impl Write, color: bool) -> io::Result<()> {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    let (Some(span), Some(notes)) = (err.span(), err.notes()) else {
        return match err {
            CompileError::Io { msg, path } | CompileError::Config { msg, path } => {
                writeln!(out, "error[{}]: {msg}", err.category())?;
                writeln!(out, "  --> {}", path.display())
            }
            _ => writeln!(out, "error[{}]: {}", err.category(), err.message()),
        };
    };

    let mut report = Report::build(ReportKind::Error, (), span.start)
        .with_config(Config::default().with_color(color))
        .with_message(format!("{} error", err.category()))
        .with_label(Label::new(span.start..span.end).with_message(err.message()));
    if let Some(code) = notes.code {
        report = report.with_code(code.code()).with_note(code.explain());
    }
    if let Some((secondary, label)) = &notes.secondary {
        if secondary.file == span.file {
            report = report.with_label(Label::new(secondary.start..secondary.end).with_message(label));
        } else {
            report = report.with_note(format!("{label}: `{}`", secondary.text()));
        }
    }
    if let Some(hint) = &notes.hint {
        report = report.with_help(hint);
    }
    report.finish().write(Source::from(span.source().to_string()), out)
}

/// Plain single-line rendering, used where ariadne output would be noise.
pub fn render_short(err: &CompileError) -> String {
    match err.span() {
        Some(span) => format!("{}:{}: {err}", span.line(), span.start),
        None => err.to_string(),
    }
}
