use miette::Diagnostic;
use thiserror::Error;

use crate::script::Location;

/// Main error type for darkroom operations
#[derive(Error, Diagnostic, Debug)]
pub enum DarkroomError {
    #[error("IO error: {0}")]
    #[diagnostic(code(darkroom::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(darkroom::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error at {location}: {message}")]
    #[diagnostic(code(darkroom::parse))]
    Parse { message: String, location: Location },

    #[error("Unknown variable '${{{name}}}' at {location}")]
    #[diagnostic(
        code(darkroom::parse::variable),
        help("Pass the variable with --var NAME=VALUE or list it under `vars:` in darkroom.yaml")
    )]
    UnknownVariable { name: String, location: Location },

    #[error("'{name}' is not a defined element")]
    #[diagnostic(code(darkroom::decode::unknown), help("Run `darkroom list` to see the registered elements"))]
    UnknownElement { name: String },

    #[error("duplicate entry for named pipeline '{name}'")]
    #[diagnostic(code(darkroom::decode::duplicate))]
    DuplicatePipeline { name: String },

    #[error("could not find definition for named pipeline '{name}'")]
    #[diagnostic(
        code(darkroom::decode::undefined),
        help("Named pipelines must be defined before they are referenced")
    )]
    UndefinedPipeline { name: String },

    #[error("{element}: argument {index}: {message}")]
    #[diagnostic(code(darkroom::argument))]
    Argument {
        element: String,
        index: usize,
        message: String,
    },

    #[error("element '{name}' is registered twice")]
    #[diagnostic(code(darkroom::registry::duplicate))]
    DuplicateElement { name: String },

    #[error("{element}: needs image input")]
    #[diagnostic(code(darkroom::exec::needs_image))]
    NeedsImage { element: String },

    #[error("execution cancelled")]
    #[diagnostic(code(darkroom::exec::cancelled))]
    Cancelled,

    #[error("{element}: {message}")]
    #[diagnostic(code(darkroom::exec))]
    Element { element: String, message: String },

    #[error("Image error: {0}")]
    #[diagnostic(code(darkroom::image))]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {message}")]
    #[diagnostic(code(darkroom::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl DarkroomError {
    /// Shorthand for an element-specific execution failure.
    pub fn element(element: impl Into<String>, message: impl Into<String>) -> Self {
        DarkroomError::Element {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Whether this is the distinguished "needs image input" failure.
    pub fn is_needs_image(&self) -> bool {
        matches!(self, DarkroomError::NeedsImage { .. })
    }
}

pub type Result<T> = std::result::Result<T, DarkroomError>;
