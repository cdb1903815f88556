use crate::error::*;
use bon::Builder;
use snafu::ensure;

#[derive(Debug, Copy, Clone, PartialEq, Builder)]
pub struct RenderConfig {
    /// Number of uniform slots the ring buffers cycle through.
    #[builder(default = 3)]
    pub frames_in_flight: u32,
    /// Draws per frame, the capacity of each transform slot.
    #[builder(default = 2048)]
    pub max_draws: u32,
    /// Material uniform writes per frame. Unset means `max_draws`.
    pub max_material_changes: Option<u32>,
    /// Material blocks that differ by less than this are not rewritten.
    #[builder(default = 0.001)]
    pub material_epsilon: f32,
    /// Upload indices in the smallest width that fits the largest index.
    #[builder(default = true)]
    pub narrow_indices: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig::builder().build()
    }
}

impl RenderConfig {
    pub fn material_capacity(&self) -> u32 {
        self.max_material_changes.unwrap_or(self.max_draws)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.frames_in_flight >= 2,
            InvalidConfigErr {
                reason: "frames_in_flight must be at least 2"
            }
        );
        ensure!(
            self.max_draws > 0,
            InvalidConfigErr {
                reason: "max_draws must not be zero"
            }
        );
        ensure!(
            self.material_capacity() > 0,
            InvalidConfigErr {
                reason: "max_material_changes must not be zero"
            }
        );
        ensure!(
            self.material_epsilon >= 0.0,
            InvalidConfigErr {
                reason: "material_epsilon must not be negative"
            }
        );

        Ok(())
    }
}
