//! Paint primitives shared across the canvas
//!
//! Colors, stroke styles, fill rules and composite modes, each convertible
//! to the corresponding kurbo/peniko type at render time.

use kurbo::{Cap as KurboCap, Join as KurboJoin, Stroke as KurboStroke};
use serde::{Deserialize, Serialize};
use vello::peniko::{BlendMode, Brush, Color, Compose, Fill, Mix};

/// Fill rule for paths
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillRule {
    /// Non-zero winding rule
    NonZero,
    /// Even-odd rule
    EvenOdd,
}

impl Default for FillRule {
    fn default() -> Self {
        FillRule::NonZero
    }
}

impl From<FillRule> for Fill {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => Fill::NonZero,
            FillRule::EvenOdd => Fill::EvenOdd,
        }
    }
}

/// Stroke cap style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cap {
    Butt,
    Round,
    Square,
}

impl Default for Cap {
    fn default() -> Self {
        Cap::Butt
    }
}

impl From<Cap> for KurboCap {
    fn from(cap: Cap) -> Self {
        match cap {
            Cap::Butt => KurboCap::Butt,
            Cap::Round => KurboCap::Round,
            Cap::Square => KurboCap::Square,
        }
    }
}

/// Stroke join style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Join {
    Miter,
    Round,
    Bevel,
}

impl Default for Join {
    fn default() -> Self {
        Join::Miter
    }
}

impl From<Join> for KurboJoin {
    fn from(join: Join) -> Self {
        match join {
            Join::Miter => KurboJoin::Miter,
            Join::Round => KurboJoin::Round,
            Join::Bevel => KurboJoin::Bevel,
        }
    }
}

/// Stroke style for entities
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke width in pixels
    pub width: f64,
    /// Cap style
    #[serde(default)]
    pub cap: Cap,
    /// Join style
    #[serde(default)]
    pub join: Join,
    /// Miter limit (for miter joins)
    #[serde(default = "default_miter_limit")]
    pub miter_limit: f64,
}

fn default_miter_limit() -> f64 {
    4.0
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 4.0,
        }
    }
}

impl StrokeStyle {
    /// A round-capped, round-joined stroke, as produced by freehand tools
    pub fn round(width: f64) -> Self {
        Self {
            width,
            cap: Cap::Round,
            join: Join::Round,
            miter_limit: 4.0,
        }
    }

    /// Convert to kurbo Stroke
    pub fn to_stroke(&self) -> KurboStroke {
        KurboStroke {
            width: self.width,
            join: self.join.into(),
            miter_limit: self.miter_limit,
            start_cap: self.cap.into(),
            end_cap: self.cap.into(),
            dash_pattern: Default::default(),
            dash_offset: 0.0,
        }
    }
}

/// Serializable color representation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ShapeColor {
    /// Create from RGB (opaque)
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create from RGBA
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Copy with the alpha channel scaled by `opacity`
    pub fn with_opacity(&self, opacity: f64) -> Self {
        let a = ((self.a as f64 / 255.0) * opacity * 255.0).round() as u8;
        Self { a, ..*self }
    }

    /// Convert to peniko Color
    pub fn to_peniko(&self) -> Color {
        Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Convert to peniko Brush
    pub fn to_brush(&self) -> Brush {
        Brush::Solid(self.to_peniko())
    }
}

/// Composite mode for an entity's pixels
///
/// `DestOut` is the subtractive mode: newly drawn pixels remove existing
/// coverage instead of painting color over it. Eraser strokes always carry
/// it, both live on the top pass and once stored inside a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeMode {
    /// Ordinary source-over painting
    SrcOver,
    /// Subtractive: drawn pixels erase backdrop coverage
    DestOut,
}

impl Default for CompositeMode {
    fn default() -> Self {
        CompositeMode::SrcOver
    }
}

impl CompositeMode {
    /// Convert to a peniko blend for layer compositing
    pub fn to_blend(self) -> BlendMode {
        match self {
            CompositeMode::SrcOver => BlendMode::new(Mix::Normal, Compose::SrcOver),
            CompositeMode::DestOut => BlendMode::new(Mix::Normal, Compose::DestOut),
        }
    }
}
