//! Mutation request shapes as they arrive over the wire.
//!
//! Every field is optional at the serde level so that a missing value is
//! reported as a [`ValidationError::MissingField`] naming it, rather than as
//! an opaque deserialization failure.

use crate::color::Color;
use crate::elements::{Circle, DEFAULT_BRUSH_SIZE, ElementId, Image, ImageFormat, Path, Rectangle, Shape, Text};
use crate::erase::DEFAULT_ERASER_SIZE;
use crate::error::ValidationError;
use kurbo::Point;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

fn props<T: DeserializeOwned>(value: Value) -> Result<T, ValidationError> {
    let value = if value.is_null() { Value::Object(Map::new()) } else { value };
    serde_json::from_value(value).map_err(|e| ValidationError::InvalidProps(e.to_string()))
}

fn color_or(value: Option<&str>, default: Color) -> Result<Color, ValidationError> {
    value.map_or(Ok(default), Color::parse)
}

fn canvas_id(value: Option<String>) -> Result<String, ValidationError> {
    let id = required("canvasId", value)?;
    if id.trim().is_empty() {
        return Err(ValidationError::MissingField("canvasId"));
    }
    Ok(id)
}

/// Canvas dimensions must be whole, positive pixel counts.
fn dimension(field: &'static str, value: Option<f64>) -> Result<u32, ValidationError> {
    let value = required(field, value)?;
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    if value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ValidationError::NotInteger { field, value });
    }
    Ok(value as u32)
}

/// `POST /init`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitCanvasRequest {
    pub name: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl InitCanvasRequest {
    /// Validated `(name, width, height)`.
    pub fn into_parts(self) -> Result<(String, u32, u32), ValidationError> {
        let name = required("name", self.name)?;
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let width = dimension("width", self.width)?;
        let height = dimension("height", self.height)?;
        Ok((name, width, height))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RectangleProps {
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    color: Option<String>,
    brush_size: Option<f64>,
    fill: Option<String>,
}

impl RectangleProps {
    fn into_shape(self) -> Result<Shape, ValidationError> {
        Ok(Shape::Rectangle(Rectangle {
            x: required("x", self.x)?,
            y: required("y", self.y)?,
            width: required("width", self.width)?,
            height: required("height", self.height)?,
            color: color_or(self.color.as_deref(), Color::BLACK)?,
            brush_size: self.brush_size.unwrap_or(DEFAULT_BRUSH_SIZE),
            fill: self.fill.as_deref().map(Color::parse).transpose()?,
        }))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CircleProps {
    x: Option<f64>,
    y: Option<f64>,
    radius: Option<f64>,
    color: Option<String>,
    brush_size: Option<f64>,
    fill: Option<String>,
}

impl CircleProps {
    fn into_shape(self) -> Result<Shape, ValidationError> {
        Ok(Shape::Circle(Circle {
            x: required("x", self.x)?,
            y: required("y", self.y)?,
            radius: required("radius", self.radius)?,
            color: color_or(self.color.as_deref(), Color::BLACK)?,
            brush_size: self.brush_size.unwrap_or(DEFAULT_BRUSH_SIZE),
            fill: self.fill.as_deref().map(Color::parse).transpose()?,
        }))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathProps {
    points: Option<Vec<Point>>,
    color: Option<String>,
    brush_size: Option<f64>,
}

impl PathProps {
    fn into_shape(self) -> Result<Shape, ValidationError> {
        Ok(Shape::Path(Path {
            points: required("points", self.points)?,
            color: color_or(self.color.as_deref(), Color::BLACK)?,
            brush_size: self.brush_size.unwrap_or(DEFAULT_BRUSH_SIZE),
        }))
    }
}

/// `POST /add/shape`: a rectangle, circle or freehand path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRequest {
    pub canvas_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub props: Value,
}

impl ShapeRequest {
    pub fn into_parts(self) -> Result<(String, Shape), ValidationError> {
        let canvas_id = canvas_id(self.canvas_id)?;
        let kind = required("type", self.kind)?;
        let shape = match kind.as_str() {
            "rectangle" => props::<RectangleProps>(self.props)?.into_shape()?,
            "circle" => props::<CircleProps>(self.props)?.into_shape()?,
            "path" => props::<PathProps>(self.props)?.into_shape()?,
            _ => return Err(ValidationError::UnknownShapeType(kind)),
        };
        shape.validate()?;
        Ok((canvas_id, shape))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextProps {
    x: Option<f64>,
    y: Option<f64>,
    text: Option<String>,
    color: Option<String>,
    font_size: Option<f64>,
}

/// `POST /add/text`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub canvas_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub props: Value,
}

impl TextRequest {
    pub fn into_parts(self) -> Result<(String, Shape), ValidationError> {
        let canvas_id = canvas_id(self.canvas_id)?;
        expect_kind("text", self.kind)?;
        let props: TextProps = props(self.props)?;
        let shape = Shape::Text(Text {
            x: required("x", props.x)?,
            y: required("y", props.y)?,
            text: required("text", props.text)?,
            color: color_or(props.color.as_deref(), Color::BLACK)?,
            font_size: props.font_size.unwrap_or(Text::DEFAULT_FONT_SIZE),
        });
        shape.validate()?;
        Ok((canvas_id, shape))
    }
}

fn expect_kind(expected: &'static str, kind: Option<String>) -> Result<(), ValidationError> {
    let found = required("type", kind)?;
    if found != expected {
        return Err(ValidationError::UnexpectedType { expected, found });
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageUrlProps {
    url: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

/// `POST /add/image-url`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrlRequest {
    pub canvas_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub props: Value,
}

impl ImageUrlRequest {
    pub fn into_parts(self) -> Result<(String, Shape), ValidationError> {
        let canvas_id = canvas_id(self.canvas_id)?;
        expect_kind("image", self.kind)?;
        let props: ImageUrlProps = props(self.props)?;
        let url = required("url", props.url)?;
        let format = url.rsplit_once('.').and_then(|(_, ext)| ImageFormat::from_extension(ext));
        let mut image = Image::new(
            url,
            Point::new(props.x.unwrap_or(0.0), props.y.unwrap_or(0.0)),
            required("width", props.width)?,
            required("height", props.height)?,
        );
        image.format = format;
        let shape = Shape::Image(image);
        shape.validate()?;
        Ok((canvas_id, shape))
    }
}

/// The JSON `props` part of an image upload.
///
/// Width and height fall back to the decoded pixel size of the upload,
/// shrunk to fit the canvas.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadProps {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ImageUploadProps {
    /// Parse the multipart `props` field; an absent field means all defaults.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => serde_json::from_str(raw).map_err(|e| ValidationError::InvalidProps(e.to_string())),
        }
    }

    /// Validated placement of an upload of `source_size` pixels on a
    /// `canvas_size` canvas. The url is left empty until the bytes are stored.
    pub fn into_image(
        self,
        format: Option<ImageFormat>,
        source_size: Option<(u32, u32)>,
        canvas_size: (u32, u32),
    ) -> Result<Image, ValidationError> {
        let position = Point::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0));
        let mut image = match (self.width, self.height, source_size) {
            (None, None, Some((w, h))) => Image::new(String::new(), position, f64::from(w), f64::from(h))
                .fit_within(f64::from(canvas_size.0), f64::from(canvas_size.1)),
            (width, height, source) => {
                let (source_w, source_h) = source.map_or((None, None), |(w, h)| (Some(f64::from(w)), Some(f64::from(h))));
                Image::new(
                    String::new(),
                    position,
                    required("width", width.or(source_w))?,
                    required("height", height.or(source_h))?,
                )
            }
        };
        image.format = format;
        image.validate_placement()?;
        Ok(image)
    }
}

/// `POST /erase`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraseRequest {
    pub canvas_id: Option<String>,
    pub erased_points: Option<Vec<Point>>,
    pub eraser_size: Option<f64>,
}

impl EraseRequest {
    /// Validated `(canvas_id, points, eraser_size)`.
    pub fn into_parts(self) -> Result<(String, Vec<Point>, f64), ValidationError> {
        let canvas_id = canvas_id(self.canvas_id)?;
        let points = required("erasedPoints", self.erased_points)?;
        let size = self.eraser_size.unwrap_or(DEFAULT_ERASER_SIZE);
        crate::geometry::validate_query(&points, size)?;
        Ok((canvas_id, points, size))
    }
}

/// `PATCH /image`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchImageRequest {
    pub canvas_id: Option<String>,
    pub element_id: Option<ElementId>,
    pub props: Option<Map<String, Value>>,
}

impl PatchImageRequest {
    pub fn into_parts(self) -> Result<(String, ElementId, Map<String, Value>), ValidationError> {
        Ok((
            canvas_id(self.canvas_id)?,
            required("elementId", self.element_id)?,
            required("props", self.props)?,
        ))
    }
}
