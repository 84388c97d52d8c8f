//! Scene to draw-command pipeline.
//!
//! Elements are visited in stored order (painter's algorithm), each one
//! mapped to at most one [`DrawCommand`] and handed to a [`Surface`].

use crate::assets::{AssetFetcher, ImageCache, prefetch_images};
use crate::command::{DrawCommand, Paint, Stroke};
use crate::pdf::PdfPage;
use crate::renderer::{RenderResult, Surface, Target};
use sketchboard_core::{Scene, Shape};
use std::io::Write;

/// Draw commands for the interactive target, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl Surface for DisplayList {
    fn draw(&mut self, command: &DrawCommand) -> RenderResult<()> {
        self.commands.push(command.clone());
        Ok(())
    }
}

/// Result of a one-call render.
#[derive(Debug)]
pub enum RenderOutput {
    Interactive(DisplayList),
    /// Encoded PDF bytes.
    Document(Vec<u8>),
}

/// Map one shape to its draw command for `target`, or `None` if it draws nothing.
pub fn command_for(shape: &Shape, images: &ImageCache, target: Target) -> Option<DrawCommand> {
    match shape {
        Shape::Path(path) => {
            let stroke = Stroke {
                color: path.color,
                width: path.brush_size,
            };
            match path.points.as_slice() {
                [] => None,
                [only] if target.draws_dots() => Some(DrawCommand::Dot {
                    center: *only,
                    diameter: path.brush_size,
                    color: path.color,
                }),
                [_] => None,
                points => Some(DrawCommand::Polyline {
                    points: points.to_vec(),
                    stroke,
                }),
            }
        }
        Shape::Rectangle(rect) => {
            let paint = Paint::new(rect.color, rect.brush_size, rect.fill);
            (!paint.is_empty()).then(|| DrawCommand::Rect {
                rect: rect.as_rect(),
                paint,
            })
        }
        Shape::Circle(circle) => {
            let paint = Paint::new(circle.color, circle.brush_size, circle.fill);
            (circle.radius > 0.0 && !paint.is_empty()).then(|| DrawCommand::Circle {
                center: circle.center(),
                radius: circle.radius,
                paint,
            })
        }
        Shape::Text(text) => (!text.text.is_empty() && text.font_size > 0.0).then(|| DrawCommand::Text {
            origin: text.origin(),
            baseline: text.baseline(),
            text: text.text.clone(),
            font_size: text.font_size,
            color: text.color,
        }),
        Shape::Image(image) => {
            let Some(decoded) = images.get(&image.url) else {
                log::debug!("image {} not available, skipping", image.url);
                return None;
            };
            (image.width > 0.0 && image.height > 0.0).then(|| DrawCommand::Image {
                rect: image.as_rect(),
                url: image.url.clone(),
                image: decoded.clone(),
            })
        }
    }
}

/// Draw every element of `scene` onto `surface`, back to front.
pub fn paint_scene<S: Surface>(surface: &mut S, scene: &Scene, images: &ImageCache, target: Target) -> RenderResult<()> {
    for element in scene.iter() {
        if let Some(command) = command_for(&element.shape, images, target) {
            surface.draw(&command)?;
        }
    }
    Ok(())
}

/// Render for the interactive target.
///
/// `preview` is the shape currently being drawn; it is composited on top of
/// the stored elements without being added to the scene.
pub fn render_interactive(scene: &Scene, images: &ImageCache, preview: Option<&Shape>) -> DisplayList {
    let mut list = DisplayList::new();
    list.commands.extend(
        scene
            .iter()
            .map(|element| &element.shape)
            .chain(preview)
            .filter_map(|shape| command_for(shape, images, Target::Interactive)),
    );
    list
}

/// Write a one-page PDF of `scene` to `sink`.
pub fn write_document<W: Write>(scene: &Scene, images: &ImageCache, sink: &mut W) -> RenderResult<()> {
    let mut page = PdfPage::new(scene.width(), scene.height());
    paint_scene(&mut page, scene, images, Target::Document)?;
    page.write_to(sink)
}

/// Render `scene` to PDF bytes.
pub fn render_document(scene: &Scene, images: &ImageCache) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_document(scene, images, &mut bytes)?;
    Ok(bytes)
}

/// Fetch the scene's images through `fetcher`, then render for `target`.
pub async fn render(scene: &Scene, target: Target, fetcher: &dyn AssetFetcher) -> RenderResult<RenderOutput> {
    let images = prefetch_images(scene, fetcher).await;
    match target {
        Target::Interactive => Ok(RenderOutput::Interactive(render_interactive(scene, &images, None))),
        Target::Document => render_document(scene, &images).map(RenderOutput::Document),
    }
}
