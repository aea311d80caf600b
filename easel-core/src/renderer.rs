//! Rendering system for canvas scenes
//!
//! Paints a Canvas into a Vello scene. Entities with an installed eraser
//! mask are painted inside their own isolation layer, clipped to the mask's
//! backing extent, with every committed stroke knocked out subtractively
//! before the layer composites back, so erased pixels stay transparent no
//! matter what is painted beneath.

use crate::canvas::Canvas;
use crate::drawable::DrawableSlot;
use crate::entity::{ClipMask, Entity, EntityKind, ImageAsset};
use crate::shape::CompositeMode;
use kurbo::{Affine, Rect};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use vello::peniko::{Blob, Fill, Image, ImageFormat};
use vello::Scene;

/// Cache for decoded image data to avoid re-decoding every frame
pub struct ImageCache {
    cache: HashMap<Uuid, Arc<Image>>,
}

impl ImageCache {
    /// Create a new empty image cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get or decode an image, caching the result
    pub fn get_or_decode(&mut self, asset: &ImageAsset) -> Option<Arc<Image>> {
        if let Some(cached) = self.cache.get(&asset.id) {
            return Some(Arc::clone(cached));
        }

        let image = decode_image_asset(asset)?;
        let arc_image = Arc::new(image);
        self.cache.insert(asset.id, Arc::clone(&arc_image));
        Some(arc_image)
    }

    /// Clear cache entry when an image asset is deleted or modified
    pub fn invalidate(&mut self, id: &Uuid) {
        self.cache.remove(id);
    }

    /// Clear all cached images
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an image asset to peniko Image
fn decode_image_asset(asset: &ImageAsset) -> Option<Image> {
    let data = asset.data.as_ref()?;

    let img = image::load_from_memory(data).ok()?;
    let rgba = img.to_rgba8();

    Some(Image::new(
        Blob::from(rgba.into_raw()),
        ImageFormat::Rgba8,
        asset.width,
        asset.height,
    ))
}

/// What a single paint pass includes
///
/// Passed explicitly through every paint call; a pass never leaks state
/// into the next one.
#[derive(Clone, Copy)]
pub struct PaintPass<'a> {
    /// Paint the background drawable slot
    pub include_background: bool,
    /// Paint the overlay drawable slot
    pub include_overlay: bool,
    /// Keep only matching ordinary entities; None keeps all
    pub entity_filter: Option<&'a dyn Fn(&Entity) -> bool>,
}

impl<'a> PaintPass<'a> {
    /// A pass painting the whole canvas
    pub fn full() -> Self {
        Self {
            include_background: true,
            include_overlay: true,
            entity_filter: None,
        }
    }
}

/// Paint a canvas into a scene
pub fn paint_canvas(scene: &mut Scene, canvas: &Canvas, cache: &mut ImageCache, pass: &PaintPass) {
    let canvas_rect = Rect::new(0.0, 0.0, canvas.width, canvas.height);
    scene.fill(
        Fill::NonZero,
        Affine::IDENTITY,
        canvas.clear_color.to_peniko(),
        None,
        &canvas_rect,
    );

    if pass.include_background {
        paint_slot(scene, &canvas.background, cache, None);
    }

    for entity in &canvas.entities {
        if let Some(filter) = pass.entity_filter {
            if !filter(entity) {
                continue;
            }
        }
        render_entity(scene, entity, Affine::IDENTITY, 1.0, cache);
    }

    if pass.include_overlay {
        paint_slot(scene, &canvas.overlay, cache, None);
    }
}

/// Paint a drawable slot, optionally keeping only matching parts
///
/// Color paints beneath image; in the merged representation the group's
/// transform and opacity apply to the surviving children.
pub fn paint_slot(
    scene: &mut Scene,
    slot: &DrawableSlot,
    cache: &mut ImageCache,
    part_filter: Option<&dyn Fn(&Entity) -> bool>,
) {
    let keep = |entity: &Entity| part_filter.map_or(true, |f| f(entity));

    if let Some(merged) = &slot.merged {
        if !merged.visible {
            return;
        }
        let parent = merged.transform.to_affine();
        let opacity = merged.transform.opacity;
        if let EntityKind::Group(children) = &merged.kind {
            for child in children {
                if keep(child) {
                    render_entity(scene, child, parent, opacity, cache);
                }
            }
        }
        return;
    }

    if let Some(color) = &slot.color {
        if keep(color) {
            render_entity(scene, color, Affine::IDENTITY, 1.0, cache);
        }
    }
    if let Some(image) = &slot.image {
        if keep(image) {
            render_entity(scene, image, Affine::IDENTITY, 1.0, cache);
        }
    }
}

/// Render a single entity and its children
pub fn render_entity(
    scene: &mut Scene,
    entity: &Entity,
    parent: Affine,
    parent_opacity: f64,
    cache: &mut ImageCache,
) {
    if !entity.visible {
        return;
    }

    let affine = parent * entity.transform.to_affine();
    let opacity = parent_opacity * entity.transform.opacity;

    match &entity.clip {
        Some(ClipMask::Eraser(mask)) => {
            // Isolate the entity so the knockouts cannot reach the backdrop
            scene.push_layer(entity.compose.to_blend(), 1.0, affine, &mask.backing_rect());
            if let Some(clip) = &mask.clip {
                scene.push_layer(CompositeMode::SrcOver.to_blend(), 1.0, affine, clip);
            }
            paint_content(scene, entity, affine, opacity, cache);
            mask.knock_out(scene, affine);
            if mask.clip.is_some() {
                scene.pop_layer();
            }
            scene.pop_layer();
        }
        Some(ClipMask::Path(clip)) => {
            scene.push_layer(entity.compose.to_blend(), 1.0, affine, clip);
            paint_content(scene, entity, affine, opacity, cache);
            scene.pop_layer();
        }
        None if entity.compose == CompositeMode::DestOut => {
            scene.push_layer(entity.compose.to_blend(), 1.0, affine, &entity.local_bounds());
            paint_content(scene, entity, affine, opacity, cache);
            scene.pop_layer();
        }
        None => {
            paint_content(scene, entity, affine, opacity, cache);
        }
    }
}

/// Paint the entity's own content, without clips or isolation
fn paint_content(
    scene: &mut Scene,
    entity: &Entity,
    affine: Affine,
    opacity: f64,
    cache: &mut ImageCache,
) {
    match &entity.kind {
        EntityKind::Path(path) => {
            if let Some(fill) = &entity.fill {
                scene.fill(
                    Fill::NonZero,
                    affine,
                    fill.with_opacity(opacity).to_peniko(),
                    None,
                    path,
                );
            }
            if let (Some(color), Some(style)) = (&entity.stroke_color, &entity.stroke_style) {
                scene.stroke(
                    &style.to_stroke(),
                    affine,
                    color.with_opacity(opacity).to_peniko(),
                    None,
                    path,
                );
            }
        }
        EntityKind::Rect { width, height } => {
            let rect = Rect::new(0.0, 0.0, *width, *height);
            if let Some(fill) = &entity.fill {
                scene.fill(
                    Fill::NonZero,
                    affine,
                    fill.with_opacity(opacity).to_peniko(),
                    None,
                    &rect,
                );
            }
            if let (Some(color), Some(style)) = (&entity.stroke_color, &entity.stroke_style) {
                scene.stroke(
                    &style.to_stroke(),
                    affine,
                    color.with_opacity(opacity).to_peniko(),
                    None,
                    &rect,
                );
            }
        }
        EntityKind::Image(asset) => {
            let Some(image) = cache.get_or_decode(asset) else {
                return;
            };
            // Image clone is cheap - the pixel data is behind an Arc'd Blob
            let image_with_alpha = (*image).clone().with_alpha(opacity as f32);
            let rect = Rect::new(0.0, 0.0, asset.width as f64, asset.height as f64);
            scene.fill(Fill::NonZero, affine, &image_with_alpha, None, &rect);
        }
        EntityKind::Group(children) => {
            for child in children {
                render_entity(scene, child, affine, opacity, cache);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_fitting::smooth_open_path;
    use crate::shape::{ShapeColor, StrokeStyle};
    use kurbo::Point;

    fn test_canvas() -> Canvas {
        let mut canvas = Canvas::new("Test", 200.0, 200.0);
        canvas.add_entity(Entity::rect(50.0, 50.0, ShapeColor::rgb(255, 0, 0)));
        canvas.add_entity(
            Entity::rect(50.0, 50.0, ShapeColor::rgb(0, 255, 0)).with_position(25.0, 25.0),
        );
        canvas
    }

    #[test]
    fn test_paint_empty_canvas() {
        let canvas = Canvas::new("Test", 100.0, 100.0);
        let mut scene = Scene::new();
        let mut cache = ImageCache::new();
        paint_canvas(&mut scene, &canvas, &mut cache, &PaintPass::full());
    }

    #[test]
    fn test_paint_canvas_with_entities() {
        let canvas = test_canvas();
        let mut scene = Scene::new();
        let mut cache = ImageCache::new();
        paint_canvas(&mut scene, &canvas, &mut cache, &PaintPass::full());
    }

    #[test]
    fn test_entity_filter_skips_entities() {
        // Filtered paint must not touch filtered-out entities; exercised by
        // rendering with a filter that drops everything
        let canvas = test_canvas();
        let mut scene = Scene::new();
        let mut cache = ImageCache::new();
        let filter = |_: &Entity| false;
        let pass = PaintPass {
            include_background: true,
            include_overlay: true,
            entity_filter: Some(&filter),
        };
        paint_canvas(&mut scene, &canvas, &mut cache, &pass);
    }

    #[test]
    fn test_render_entity_with_mask() {
        let mut entity = Entity::rect(50.0, 50.0, ShapeColor::rgb(255, 0, 0));
        let points = vec![Point::new(0.0, 0.0), Point::new(25.0, 25.0)];
        let stroke = Entity::new(EntityKind::Path(smooth_open_path(&points)))
            .with_stroke(ShapeColor::rgb(0, 0, 0), StrokeStyle::round(10.0));
        entity
            .ensure_eraser_mask()
            .add_path(stroke, Affine::IDENTITY);

        let mut scene = Scene::new();
        let mut cache = ImageCache::new();
        render_entity(&mut scene, &entity, Affine::IDENTITY, 1.0, &mut cache);
    }

    #[test]
    fn test_image_without_data_renders_nothing() {
        let entity = Entity::new(EntityKind::Image(ImageAsset::new("img", "img.png", 16, 16)));
        let mut scene = Scene::new();
        let mut cache = ImageCache::new();
        render_entity(&mut scene, &entity, Affine::IDENTITY, 1.0, &mut cache);
    }

    #[test]
    fn test_invisible_entity_skipped() {
        let mut entity = Entity::rect(50.0, 50.0, ShapeColor::rgb(255, 0, 0));
        entity.visible = false;
        let mut scene = Scene::new();
        let mut cache = ImageCache::new();
        render_entity(&mut scene, &entity, Affine::IDENTITY, 1.0, &mut cache);
    }
}
