use crate::assets::ShaderStage;
use snafu::Snafu;

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
#[snafu(visibility(pub(crate)))]
pub enum RenderError {
    #[snafu(display("Geometry has no vertices or an empty index list"))]
    EmptyGeometry,

    #[snafu(display("Index {index} points past the end of a mesh with {vertex_count} vertices"))]
    IndexOutOfBounds { index: u64, vertex_count: usize },

    #[snafu(display("Index {index} does not fit into a 32-bit index buffer"))]
    IndexTooWide { index: u64 },

    #[snafu(display("A drawable with the key {key} is already part of the scene"))]
    DuplicateKey { key: String },

    #[snafu(display("The drawable with the key {key} is not a {expected}"))]
    TypeMismatch { key: String, expected: &'static str },

    #[snafu(display("The {stage} shader source is missing"))]
    MissingShaderSource { stage: ShaderStage },

    #[snafu(display("Shader {label} failed to compile:\n{message}"))]
    ShaderCompile { label: String, message: String },

    #[snafu(display("Texture data is {actual} bytes, but {expected} bytes were expected"))]
    InvalidTextureData { expected: usize, actual: usize },

    #[snafu(display("Failed to decode image: {source}"))]
    ImageDecode { source: image::ImageError },

    #[snafu(display("Texture channel count {channels} is not supported (expected 1 to 4)"))]
    UnsupportedChannels { channels: u8 },

    #[snafu(display(
        "Texture array layer is {width}x{height}, but the array holds {expected_width}x{expected_height} layers"
    ))]
    TextureLayerMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[snafu(display("Texture array is full: {limit} layers is the limit"))]
    TextureArrayFull { limit: u32 },

    #[snafu(display("Uniform ring overflow: draw #{draw} does not fit into {capacity} slots per frame"))]
    UniformOverflow { draw: u32, capacity: u32 },

    #[snafu(display("Invalid render configuration: {reason}"))]
    InvalidConfig { reason: &'static str },

    #[snafu(display("Draws were flushed before a frame was begun"))]
    FrameNotStarted,

    #[snafu(display("Backend failure: {message}"))]
    Backend { message: String },
}
