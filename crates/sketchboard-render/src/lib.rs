//! Sketchboard Render Library
//!
//! Turns a [`Scene`](sketchboard_core::Scene) into draw commands for an
//! on-screen surface, or into a single-page PDF document.

pub mod assets;
mod command;
mod pdf;
mod pipeline;
mod renderer;

pub use assets::{AssetFetcher, DecodedImage, ImageCache, image_urls, prefetch_images};
pub use command::{DrawCommand, Paint, Stroke};
pub use pdf::PdfPage;
pub use pipeline::{
    DisplayList, RenderOutput, command_for, paint_scene, render, render_document, render_interactive, write_document,
};
pub use renderer::{RenderError, RenderResult, Surface, Target};
