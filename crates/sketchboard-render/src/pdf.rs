//! Document target: a single PDF page the size of the scene.
//!
//! Canvas coordinates have their origin at the top-left with y growing down;
//! PDF user space grows up from the bottom-left, so every y is flipped
//! against the page height. Each command is wrapped in `q`/`Q` so graphics
//! state never leaks between elements.

use crate::assets::DecodedImage;
use crate::command::{DrawCommand, Paint, Stroke};
use crate::renderer::{RenderError, RenderResult, Surface};
use kurbo::{PathEl, Point, Rect, Shape as _};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use sketchboard_core::Color;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::Arc;

/// Resource name of the one font used for text runs.
const FONT_NAME: &str = "F1";

/// Flattening tolerance for circles, in points.
const CURVE_TOLERANCE: f64 = 0.1;

fn real(value: f64) -> Object {
    (value as f32).into()
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn document_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Document(e.to_string())
}

/// Encode text for a WinAnsi Type1 font. Characters outside Latin-1 become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// One page under construction.
pub struct PdfPage {
    width: f64,
    height: f64,
    operations: Vec<Operation>,
    /// Image XObjects as (resource name, pixels), in first-use order.
    images: Vec<(String, Arc<DecodedImage>)>,
    /// Url to resource name, so a repeated image is embedded once.
    image_names: HashMap<String, String>,
    /// (stroke alpha, fill alpha) to ExtGState resource name.
    alpha_states: BTreeMap<(u8, u8), String>,
    uses_font: bool,
}

impl PdfPage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: f64::from(width),
            height: f64::from(height),
            operations: Vec::new(),
            images: Vec::new(),
            image_names: HashMap::new(),
            alpha_states: BTreeMap::new(),
            uses_font: false,
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn flip(&self, point: Point) -> (Object, Object) {
        (real(point.x), real(self.height - point.y))
    }

    fn set_alpha(&mut self, stroke: u8, fill: u8) {
        if stroke == 255 && fill == 255 {
            return;
        }
        let next = format!("GS{}", self.alpha_states.len() + 1);
        let state = self.alpha_states.entry((stroke, fill)).or_insert(next).clone();
        self.op("gs", vec![name(&state)]);
    }

    fn set_fill_color(&mut self, color: Color) {
        let [r, g, b] = color.to_unit_rgb();
        self.op("rg", vec![r.into(), g.into(), b.into()]);
    }

    fn set_stroke(&mut self, stroke: Stroke) {
        let [r, g, b] = stroke.color.to_unit_rgb();
        self.op("RG", vec![r.into(), g.into(), b.into()]);
        self.op("w", vec![real(stroke.width)]);
    }

    /// Set colors and alpha for `paint`, returning the painting operator.
    fn apply_paint(&mut self, paint: &Paint) -> &'static str {
        let stroke_alpha = paint.stroke.map_or(255, |s| s.color.a);
        let fill_alpha = paint.fill.map_or(255, |c| c.a);
        self.set_alpha(stroke_alpha, fill_alpha);
        if let Some(fill) = paint.fill {
            self.set_fill_color(fill);
        }
        if let Some(stroke) = paint.stroke {
            self.set_stroke(stroke);
        }
        match (paint.fill.is_some(), paint.stroke.is_some()) {
            (true, true) => "B",
            (true, false) => "f",
            (false, true) => "S",
            (false, false) => "n",
        }
    }

    /// Append path construction operators for `elements`.
    fn path(&mut self, elements: impl IntoIterator<Item = PathEl>) {
        let mut last = Point::ZERO;
        for element in elements {
            match element {
                PathEl::MoveTo(p) => {
                    let (x, y) = self.flip(p);
                    self.op("m", vec![x, y]);
                    last = p;
                }
                PathEl::LineTo(p) => {
                    let (x, y) = self.flip(p);
                    self.op("l", vec![x, y]);
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    // Degree elevation: PDF has no quadratic segments.
                    let c1 = last + (p1 - last) * (2.0 / 3.0);
                    let c2 = p2 + (p1 - p2) * (2.0 / 3.0);
                    self.curve(c1, c2, p2);
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    self.curve(p1, p2, p3);
                    last = p3;
                }
                PathEl::ClosePath => self.op("h", vec![]),
            }
        }
    }

    fn curve(&mut self, p1: Point, p2: Point, p3: Point) {
        let (x1, y1) = self.flip(p1);
        let (x2, y2) = self.flip(p2);
        let (x3, y3) = self.flip(p3);
        self.op("c", vec![x1, y1, x2, y2, x3, y3]);
    }

    fn rect(&mut self, rect: Rect, paint: &Paint) {
        let operator = self.apply_paint(paint);
        self.op(
            "re",
            vec![
                real(rect.x0),
                real(self.height - rect.y1),
                real(rect.width()),
                real(rect.height()),
            ],
        );
        self.op(operator, vec![]);
    }

    fn circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        let operator = self.apply_paint(paint);
        self.path(kurbo::Circle::new(center, radius).path_elements(CURVE_TOLERANCE));
        self.op(operator, vec![]);
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke) {
        self.set_alpha(stroke.color.a, 255);
        self.set_stroke(stroke);
        self.op("J", vec![Object::Integer(1)]);
        self.op("j", vec![Object::Integer(1)]);
        let mut points = points.iter();
        if let Some(first) = points.next() {
            self.path(std::iter::once(PathEl::MoveTo(*first)).chain(points.map(|p| PathEl::LineTo(*p))));
        }
        self.op("S", vec![]);
    }

    fn text(&mut self, baseline: Point, text: &str, font_size: f64, color: Color) {
        self.uses_font = true;
        self.set_alpha(255, color.a);
        self.set_fill_color(color);
        let (x, y) = self.flip(baseline);
        self.op("BT", vec![]);
        self.op("Tf", vec![name(FONT_NAME), real(font_size)]);
        self.op("Td", vec![x, y]);
        self.op("Tj", vec![Object::string_literal(win_ansi(text))]);
        self.op("ET", vec![]);
    }

    fn image(&mut self, rect: Rect, url: &str, image: &Arc<DecodedImage>) {
        let resource = match self.image_names.get(url) {
            Some(resource) => resource.clone(),
            None => {
                let resource = format!("Im{}", self.images.len() + 1);
                self.images.push((resource.clone(), Arc::clone(image)));
                self.image_names.insert(url.to_string(), resource.clone());
                resource
            }
        };
        // Image space is the unit square; scale it onto the target box.
        self.op(
            "cm",
            vec![
                real(rect.width()),
                Object::Integer(0),
                Object::Integer(0),
                real(rect.height()),
                real(rect.x0),
                real(self.height - rect.y1),
            ],
        );
        self.op("Do", vec![name(&resource)]);
    }

    /// Assemble the document and write it to `sink`.
    pub fn write_to<W: Write>(self, sink: &mut W) -> RenderResult<()> {
        let mut doc = self.into_document()?;
        doc.save_to(sink).map_err(document_error)?;
        Ok(())
    }

    fn into_document(self) -> RenderResult<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut resources = Dictionary::new();
        if self.uses_font {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            resources.set("Font", dictionary! { FONT_NAME => font_id });
        }

        if !self.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (resource, image) in &self.images {
                let image_id = embed_image(&mut doc, image);
                xobjects.set(resource.as_str(), image_id);
            }
            resources.set("XObject", xobjects);
        }

        if !self.alpha_states.is_empty() {
            let mut states = Dictionary::new();
            for ((stroke, fill), resource) in &self.alpha_states {
                states.set(
                    resource.as_str(),
                    dictionary! {
                        "Type" => "ExtGState",
                        "CA" => f32::from(*stroke) / 255.0,
                        "ca" => f32::from(*fill) / 255.0,
                    },
                );
            }
            resources.set("ExtGState", states);
        }

        let content = Content {
            operations: self.operations,
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().map_err(document_error)?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(self.width as i64),
                Object::Integer(self.height as i64),
            ],
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => Object::Integer(1),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }
}

/// Add an RGB image XObject, with a grayscale soft mask when it has transparency.
fn embed_image(doc: &mut Document, image: &DecodedImage) -> lopdf::ObjectId {
    let width = Object::Integer(i64::from(image.width()));
    let height = Object::Integer(i64::from(image.height()));

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width.clone(),
        "Height" => height.clone(),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => Object::Integer(8),
    };
    if image.has_alpha() {
        let mask = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        };
        let mask_id = doc.add_object(Stream::new(mask, image.alpha()));
        dict.set("SMask", mask_id);
    }
    doc.add_object(Stream::new(dict, image.rgb()))
}

impl Surface for PdfPage {
    fn draw(&mut self, command: &DrawCommand) -> RenderResult<()> {
        self.op("q", vec![]);
        match command {
            DrawCommand::Polyline { points, stroke } => self.polyline(points, *stroke),
            DrawCommand::Dot { center, diameter, color } => {
                let paint = Paint {
                    fill: Some(*color),
                    stroke: None,
                };
                self.circle(*center, diameter / 2.0, &paint);
            }
            DrawCommand::Rect { rect, paint } => self.rect(*rect, paint),
            DrawCommand::Circle { center, radius, paint } => self.circle(*center, *radius, paint),
            DrawCommand::Text {
                baseline,
                text,
                font_size,
                color,
                ..
            } => self.text(*baseline, text, *font_size, *color),
            DrawCommand::Image { rect, url, image } => self.image(*rect, url, image),
        }
        self.op("Q", vec![]);
        Ok(())
    }
}
