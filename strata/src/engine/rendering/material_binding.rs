use crate::assets::Material;
use crate::rendering::TextureId;
use crate::rendering::uniform::MaterialUniform;

/// Everything a draw needs bound for its material.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub diffuse: TextureId,
    pub layered: TextureId,
    pub uniform: MaterialUniform,
}

/// Decides which textures a material binds and what its uniform block holds.
///
/// Unset textures resolve to the defaults. The binder also remembers the last
/// uniform block it handed out, so the renderer only rewrites it on a change.
#[derive(Debug, Clone)]
pub struct MaterialBinder {
    default_texture: TextureId,
    default_array: TextureId,
    epsilon: f32,
    last: Option<MaterialUniform>,
}

impl MaterialBinder {
    pub fn new(default_texture: TextureId, default_array: TextureId, epsilon: f32) -> Self {
        MaterialBinder {
            default_texture,
            default_array,
            epsilon,
            last: None,
        }
    }

    /// Forgets the last written block. The next material always counts as changed.
    pub fn reset(&mut self) {
        self.last = None;
    }

    fn plain_texture(&self, material: &Material) -> Option<TextureId> {
        material.texture_id().filter(|id| *id != self.default_texture)
    }

    fn array_texture(&self, material: &Material) -> Option<TextureId> {
        material.texture_array_id().filter(|id| *id != self.default_array)
    }

    /// 0.0 samples only the plain texture, 1.0 only the array layer.
    ///
    /// A material with both uses its own ratio. A plain texture that is the
    /// default one does not count as set.
    pub fn mix_amount(&self, material: &Material) -> f32 {
        match (self.plain_texture(material), self.array_texture(material)) {
            (Some(_), Some(_)) => material.mix.clamp(0.0, 1.0),
            (None, Some(_)) => 1.0,
            (Some(_), None) | (None, None) => 0.0,
        }
    }

    pub fn layer(&self, material: &Material) -> u32 {
        match self.array_texture(material) {
            Some(_) => material.layer,
            None => 0,
        }
    }

    pub fn resolve(&self, material: &Material) -> ResolvedMaterial {
        ResolvedMaterial {
            diffuse: self.plain_texture(material).unwrap_or(self.default_texture),
            layered: self.array_texture(material).unwrap_or(self.default_array),
            uniform: MaterialUniform::new(material.color, self.mix_amount(material), self.layer(material)),
        }
    }

    /// Records `uniform` as the current block. Returns true if it differs from
    /// the previous one by more than the epsilon and has to be written.
    pub fn update(&mut self, uniform: &MaterialUniform) -> bool {
        let changed = self
            .last
            .as_ref()
            .is_none_or(|last| last.differs(uniform, self.epsilon));

        if changed {
            self.last = Some(*uniform);
        }

        changed
    }
}
