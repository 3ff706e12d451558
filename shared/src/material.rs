//! Material description read by the exporter.

use crate::ids::MaterialId;

/// Render queue (draw priority) values.
///
/// Only [`OPAQUE`](render_queue::OPAQUE) has special meaning to the
/// exporter: any other value marks the material as transparent.
pub mod render_queue {
    /// Canonical opaque pass.
    pub const OPAQUE: i32 = 2000;
    /// Alpha-tested (cutout) geometry.
    pub const ALPHA_TEST: i32 = 2450;
    /// Alpha-blended geometry.
    pub const TRANSPARENT: i32 = 3000;
}

/// Linear RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }

    /// Clamp every channel into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self::rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A surface material.
///
/// Cloning keeps the handle, so a clone is the same material.
#[derive(Debug, Clone)]
pub struct Material {
    id: MaterialId,
    pub name: String,
    /// Surface colour. `None` means the material exposes no colour property.
    pub color: Option<Color>,
    pub render_queue: i32,
}

impl Material {
    /// New opaque material without a colour property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MaterialId::next(),
            name: name.into(),
            color: None,
            render_queue: render_queue::OPAQUE,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_render_queue(mut self, queue: i32) -> Self {
        self.render_queue = queue;
        self
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// The colour to write, falling back to opaque white.
    pub fn surface_color(&self) -> Color {
        self.color.unwrap_or(Color::WHITE)
    }

    pub fn is_opaque(&self, opaque_queue: i32) -> bool {
        self.render_queue == opaque_queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_is_opaque_white() {
        let m = Material::new("Plain");
        assert_eq!(m.surface_color(), Color::WHITE);
        assert!(m.is_opaque(render_queue::OPAQUE));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let m = Material::new("Shared").with_color(Color::rgb(0.5, 0.25, 0.0));
        let c = m.clone();
        assert_eq!(m.id(), c.id());
        assert_ne!(m.id(), Material::new("Shared").id());
    }

    #[test]
    fn test_transparent_queue() {
        let m = Material::new("Glass").with_render_queue(render_queue::TRANSPARENT);
        assert!(!m.is_opaque(render_queue::OPAQUE));
        assert!(m.is_opaque(render_queue::TRANSPARENT));
    }

    #[test]
    fn test_clamped() {
        let c = Color::rgba(1.5, -0.2, 0.3, 2.0).clamped();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.3, 1.0));
    }
}
