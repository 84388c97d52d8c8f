//! Scene: canvas dimensions plus the ordered element list.

use crate::elements::{Element, ElementId, Image, Shape};
use crate::error::{SceneError, ValidationError, finite, non_negative};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// A drawing: fixed dimensions and elements in paint order (back to front).
///
/// Fields are private so a `Scene` only ever holds validated elements; the
/// only ways in are [`Scene::new`], the mutation methods, and deserialization,
/// which re-validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneRepr", rename_all = "camelCase")]
pub struct Scene {
    id: String,
    name: String,
    width: u32,
    height: u32,
    elements: Vec<Element>,
    next_element_id: u64,
    #[serde(default)]
    updated_at_ms: u64,
}

/// Partial update of an image's placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ImagePatch {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }

    fn apply(&self, image: &Image) -> Result<Image, ValidationError> {
        let mut patched = image.clone();
        if let Some(x) = self.x {
            patched.x = finite("x", x)?;
        }
        if let Some(y) = self.y {
            patched.y = finite("y", y)?;
        }
        if let Some(width) = self.width {
            patched.width = non_negative("width", width)?;
        }
        if let Some(height) = self.height {
            patched.height = non_negative("height", height)?;
        }
        Ok(patched)
    }
}

impl Scene {
    /// Create an empty scene with a fresh id.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4().to_string(), name, width, height)
    }

    /// Create an empty scene under a caller-chosen id.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_header(&name, width, height)?;
        Ok(Self {
            id: id.into(),
            name,
            width,
            height,
            elements: Vec::new(),
            next_element_id: 1,
            updated_at_ms: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Elements in paint order: later entries are drawn on top.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Last-modified stamp (milliseconds since the Unix epoch), 0 if never set.
    pub fn updated_at_ms(&self) -> u64 {
        self.updated_at_ms
    }

    /// Record a modification time. The core never reads the clock itself.
    pub fn touch(&mut self, now_ms: u64) {
        self.updated_at_ms = now_ms;
    }

    /// Validate `shape` and append it on top of the z-order.
    pub fn append(&mut self, shape: Shape) -> Result<ElementId, SceneError> {
        shape.validate()?;
        let next = self.next_element_id.checked_add(1).ok_or(ValidationError::IdsExhausted)?;
        let id = ElementId::new(self.next_element_id);
        self.next_element_id = next;
        log::debug!("scene {}: append {} as element {}", self.id, shape.kind(), id);
        self.elements.push(Element { id, shape });
        Ok(id)
    }

    /// Remove one element by identity.
    pub fn remove(&mut self, id: ElementId) -> Result<Element, SceneError> {
        let index = self.index_of(id)?;
        Ok(self.elements.remove(index))
    }

    /// Shallow-merge `props` over an element's properties.
    ///
    /// Only image placement (`x`, `y`, `width`, `height`) is patchable; any
    /// other key, or a non-image target, is rejected without changes.
    pub fn patch_properties(&mut self, id: ElementId, props: &Map<String, Value>) -> Result<(), SceneError> {
        let index = self.index_of(id)?;
        let kind = self.elements[index].kind();
        if !matches!(self.elements[index].shape, Shape::Image(_)) {
            return Err(ValidationError::UnsupportedPatch { kind }.into());
        }
        let patch: ImagePatch = serde_json::from_value(Value::Object(props.clone()))
            .map_err(|e| ValidationError::InvalidProps(e.to_string()))?;
        self.patch_image(id, patch)
    }

    /// Apply a typed image patch.
    pub fn patch_image(&mut self, id: ElementId, patch: ImagePatch) -> Result<(), SceneError> {
        let index = self.index_of(id)?;
        let element = &mut self.elements[index];
        let Shape::Image(image) = &element.shape else {
            return Err(ValidationError::UnsupportedPatch { kind: element.kind() }.into());
        };
        let patched = patch.apply(image)?;
        patched.validate()?;
        element.shape = Shape::Image(patched);
        Ok(())
    }

    /// A copy of this scene holding `elements` instead of the current list.
    ///
    /// Identity counters carry over, so ids dropped here are never reissued.
    pub(crate) fn with_elements(&self, elements: Vec<Element>) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            elements,
            next_element_id: self.next_element_id,
            updated_at_ms: self.updated_at_ms,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn index_of(&self, id: ElementId) -> Result<usize, SceneError> {
        self.elements
            .iter()
            .position(|e| e.id == id)
            .ok_or(SceneError::ElementNotFound(id))
    }
}

fn validate_header(name: &str, width: u32, height: u32) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if width == 0 {
        return Err(ValidationError::NotPositive { field: "width", value: 0.0 });
    }
    if height == 0 {
        return Err(ValidationError::NotPositive { field: "height", value: 0.0 });
    }
    Ok(())
}

/// Unvalidated on-disk form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneRepr {
    id: String,
    name: String,
    width: u32,
    height: u32,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    next_element_id: u64,
    #[serde(default)]
    updated_at_ms: u64,
}

impl TryFrom<SceneRepr> for Scene {
    type Error = ValidationError;

    fn try_from(repr: SceneRepr) -> Result<Self, Self::Error> {
        validate_header(&repr.name, repr.width, repr.height)?;
        let mut seen = HashSet::with_capacity(repr.elements.len());
        let mut next_element_id = repr.next_element_id;
        for element in &repr.elements {
            element.shape.validate()?;
            if !seen.insert(element.id) {
                return Err(ValidationError::DuplicateElementId(element.id));
            }
            let after = element.id.get().checked_add(1).ok_or(ValidationError::IdsExhausted)?;
            next_element_id = next_element_id.max(after);
        }
        Ok(Self {
            id: repr.id,
            name: repr.name,
            width: repr.width,
            height: repr.height,
            elements: repr.elements,
            next_element_id,
            updated_at_ms: repr.updated_at_ms,
        })
    }
}
