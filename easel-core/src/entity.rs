//! Entity system for the canvas scene graph
//!
//! An Entity is a positioned piece of scene content: a vector path, a
//! rectangle, an image, or a group of child entities. Entities carry their
//! own paint properties, an `erasable` flag gating the eraser tool, and an
//! optional clip slot which may hold either a plain vector clip or an
//! accumulated [`EraserMask`](crate::eraser::EraserMask).

use crate::eraser::EraserMask;
use crate::shape::{CompositeMode, ShapeColor, StrokeStyle};
use kurbo::{Affine, BezPath, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// 2D transform for an entity
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transform {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Rotation in degrees
    pub rotation: f64,
    /// X scale factor
    pub scale_x: f64,
    /// Y scale factor
    pub scale_y: f64,
    /// X skew in degrees
    pub skew_x: f64,
    /// Y skew in degrees
    pub skew_y: f64,
    /// Opacity (0.0 to 1.0)
    pub opacity: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            opacity: 1.0,
        }
    }
}

impl Transform {
    /// Create a new default transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with position
    pub fn with_position(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// Set position
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Set scale
    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
    }

    /// Convert to an affine transform matrix
    pub fn to_affine(&self) -> Affine {
        // Build transform: translate * rotate * scale * skew
        let translate = Affine::translate((self.x, self.y));
        let rotate = Affine::rotate(self.rotation.to_radians());
        let scale = Affine::scale_non_uniform(self.scale_x, self.scale_y);

        let skew_x = if self.skew_x != 0.0 {
            let tan_skew = self.skew_x.to_radians().tan();
            Affine::new([1.0, 0.0, tan_skew, 1.0, 0.0, 0.0])
        } else {
            Affine::IDENTITY
        };

        let skew_y = if self.skew_y != 0.0 {
            let tan_skew = self.skew_y.to_radians().tan();
            Affine::new([1.0, tan_skew, 0.0, 1.0, 0.0, 0.0])
        } else {
            Affine::IDENTITY
        };

        translate * rotate * scale * skew_x * skew_y
    }
}

/// Image asset for bitmap drawables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Unique identifier
    pub id: Uuid,

    /// Asset name (usually derived from filename)
    pub name: String,

    /// Original file path
    pub path: PathBuf,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Embedded image data
    /// If None, the image cannot be decoded and renders as nothing
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Vec<u8>>,
}

impl ImageAsset {
    /// Create a new image asset
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            width,
            height,
            data: None,
        }
    }

    /// Attach embedded image data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }
}

/// The geometric content of an entity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Vector path geometry in local coordinates
    Path(BezPath),
    /// Axis-aligned rectangle anchored at the local origin
    Rect { width: f64, height: f64 },
    /// Bitmap drawable anchored at the local origin
    Image(ImageAsset),
    /// Grouped children rendered in order
    Group(Vec<Entity>),
}

/// Clip installed on an entity
///
/// At most one clip at a time. A plain clip that exists when an entity first
/// gets erased is moved into the new mask as the mask's own clip, so erasure
/// stays bounded by the pre-existing clip region.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipMask {
    /// Plain vector clip
    Path(BezPath),
    /// Accumulated eraser mask
    Eraser(EraserMask),
}

/// A positioned scene entity
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: Uuid,

    /// Name for display in UI
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,

    /// Geometric content
    pub kind: EntityKind,

    /// Transform properties
    pub transform: Transform,

    /// Fill color, if filled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill: Option<ShapeColor>,

    /// Stroke color, if stroked
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stroke_color: Option<ShapeColor>,

    /// Stroke style, if stroked
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stroke_style: Option<StrokeStyle>,

    /// Composite mode applied when painting this entity
    #[serde(default)]
    pub compose: CompositeMode,

    /// Whether the entity is painted at all
    #[serde(default = "default_true")]
    pub visible: bool,

    /// Whether the eraser tool may mask this entity
    #[serde(default)]
    pub erasable: bool,

    /// Whether the entity participates in selection
    #[serde(default = "default_true")]
    pub selectable: bool,

    /// Whether the entity participates in hit testing
    #[serde(default = "default_true")]
    pub hit_testable: bool,

    /// Installed clip, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clip: Option<ClipMask>,

    /// World-space bounds cached by `set_coords`
    #[serde(skip)]
    pub cached_bounds: Option<Rect>,
}

fn default_true() -> bool {
    true
}

impl Entity {
    /// Create a new entity from its content
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            kind,
            transform: Transform::default(),
            fill: None,
            stroke_color: None,
            stroke_style: None,
            compose: CompositeMode::SrcOver,
            visible: true,
            erasable: false,
            selectable: true,
            hit_testable: true,
            clip: None,
            cached_bounds: None,
        }
    }

    /// Create a filled rectangle entity
    pub fn rect(width: f64, height: f64, fill: ShapeColor) -> Self {
        Self::new(EntityKind::Rect { width, height }).with_fill(fill)
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.transform.set_position(x, y);
        self
    }

    /// Set the fill color
    pub fn with_fill(mut self, fill: ShapeColor) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Set stroke color and style
    pub fn with_stroke(mut self, color: ShapeColor, style: StrokeStyle) -> Self {
        self.stroke_color = Some(color);
        self.stroke_style = Some(style);
        self
    }

    /// Set the composite mode
    pub fn with_compose(mut self, compose: CompositeMode) -> Self {
        self.compose = compose;
        self
    }

    /// Set the erasable flag
    pub fn with_erasable(mut self, erasable: bool) -> Self {
        self.erasable = erasable;
        self
    }

    /// Bounding box of the content in local coordinates
    ///
    /// Stroked paths are inflated by half the stroke width so the painted
    /// extent is covered.
    pub fn local_bounds(&self) -> Rect {
        match &self.kind {
            EntityKind::Path(path) => {
                let bbox = path.bounding_box();
                match &self.stroke_style {
                    Some(style) => bbox.inflate(style.width / 2.0, style.width / 2.0),
                    None => bbox,
                }
            }
            EntityKind::Rect { width, height } => Rect::new(0.0, 0.0, *width, *height),
            EntityKind::Image(asset) => {
                Rect::new(0.0, 0.0, asset.width as f64, asset.height as f64)
            }
            EntityKind::Group(children) => {
                let mut combined: Option<Rect> = None;
                for child in children {
                    let child_bounds = child
                        .transform
                        .to_affine()
                        .transform_rect_bbox(child.local_bounds());
                    combined = Some(match combined {
                        None => child_bounds,
                        Some(existing) => existing.union(child_bounds),
                    });
                }
                combined.unwrap_or(Rect::ZERO)
            }
        }
    }

    /// World transform given the parent's accumulated transform
    pub fn world_transform(&self, parent: Affine) -> Affine {
        parent * self.transform.to_affine()
    }

    /// Bounding box in world coordinates
    pub fn world_bounds(&self, parent: Affine) -> Rect {
        self.world_transform(parent)
            .transform_rect_bbox(self.local_bounds())
    }

    /// Cache the current world-space bounds on the entity
    pub fn set_coords(&mut self, parent: Affine) {
        self.cached_bounds = Some(self.world_bounds(parent));
    }

    /// Whether the entity currently carries an eraser mask
    pub fn has_eraser_mask(&self) -> bool {
        matches!(self.clip, Some(ClipMask::Eraser(_)))
    }

    /// The entity's eraser mask, if any
    pub fn eraser_mask(&self) -> Option<&EraserMask> {
        match &self.clip {
            Some(ClipMask::Eraser(mask)) => Some(mask),
            _ => None,
        }
    }

    /// Get the eraser mask, creating it on first use
    ///
    /// A pre-existing plain clip is moved into the new mask so erasure never
    /// reveals pixels outside the owner's prior clip region.
    pub fn ensure_eraser_mask(&mut self) -> &mut EraserMask {
        if !self.has_eraser_mask() {
            let bounds = self.local_bounds();
            let inherited = match self.clip.take() {
                Some(ClipMask::Path(path)) => Some(path),
                _ => None,
            };
            self.clip = Some(ClipMask::Eraser(EraserMask::new(bounds, inherited)));
        }
        match self.clip.as_mut() {
            Some(ClipMask::Eraser(mask)) => mask,
            _ => unreachable!("eraser mask installed above"),
        }
    }
}
