use crate::rendering::cache::GpuTexture;
use crate::rendering::TextureId;
use bon::Builder;
use nalgebra::Vector4;
use std::sync::Arc;

/// Surface description of a drawable.
///
/// `texture` and `texture_array` are optional. An unset or cleared texture is
/// drawn with the built-in solid white texture instead. When both are set,
/// `mix` blends from the plain texture (0.0) to the array layer (1.0).
#[derive(Debug, Clone, Builder)]
pub struct Material {
    #[builder(default = Vector4::new(1.0, 1.0, 1.0, 1.0))]
    pub color: Vector4<f32>,
    pub texture: Option<Arc<GpuTexture>>,
    pub texture_array: Option<Arc<GpuTexture>>,
    #[builder(default = 0)]
    pub layer: u32,
    #[builder(default = 0.5)]
    pub mix: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material::builder().build()
    }
}

impl Material {
    pub fn texture_id(&self) -> Option<TextureId> {
        self.texture.as_ref().map(|t| t.id())
    }

    pub fn texture_array_id(&self) -> Option<TextureId> {
        self.texture_array.as_ref().map(|t| t.id())
    }

    pub fn set_texture(&mut self, texture: Option<Arc<GpuTexture>>) {
        self.texture = texture;
    }

    pub fn clear_texture(&mut self) {
        self.texture = None;
    }

    pub fn set_texture_array(&mut self, texture_array: Option<Arc<GpuTexture>>, layer: u32) {
        self.texture_array = texture_array;
        self.layer = layer;
    }
}
