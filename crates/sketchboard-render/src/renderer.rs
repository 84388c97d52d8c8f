//! Render target abstraction.

use crate::command::DrawCommand;
use thiserror::Error;

/// Renderer errors.
///
/// Missing or broken images are not errors; those elements are skipped.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Document serialization failed: {0}")]
    Document(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Where a scene is being rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Mutable on-screen surface, redrawn as the user edits.
    #[default]
    Interactive,
    /// Fixed single-page vector document.
    Document,
}

impl Target {
    /// Single-point strokes are only meaningful on screen, as a dot under the cursor.
    pub fn draws_dots(self) -> bool {
        matches!(self, Target::Interactive)
    }
}

/// A backend that executes draw commands in the order given.
pub trait Surface {
    fn draw(&mut self, command: &DrawCommand) -> RenderResult<()>;
}
