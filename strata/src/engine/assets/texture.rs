use crate::assets::{ContentHash, ContentHasher};
use crate::error::*;
use snafu::{ResultExt, ensure};

pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// A 2D RGBA8 image as it is uploaded to the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Texture {
    /// Takes raw pixels with 1 to 4 channels and expands them to RGBA8.
    ///
    /// One channel becomes gray, two channels are gray and alpha, three are RGB
    /// with an opaque alpha.
    pub fn from_pixels(width: u32, height: u32, channels: u8, pixels: &[u8]) -> Result<Texture> {
        ensure!((1..=4).contains(&channels), UnsupportedChannelsErr { channels });

        let pixel_count = width as usize * height as usize;
        let expected = pixel_count * channels as usize;
        ensure!(
            expected != 0 && pixels.len() == expected,
            InvalidTextureDataErr {
                expected,
                actual: pixels.len()
            }
        );

        let data = match channels {
            4 => pixels.to_vec(),
            _ => {
                let mut data = Vec::with_capacity(pixel_count * 4);
                for pixel in pixels.chunks_exact(channels as usize) {
                    let rgba = match *pixel {
                        [l] => [l, l, l, 255],
                        [l, a] => [l, l, l, a],
                        [r, g, b] => [r, g, b, 255],
                        _ => unreachable!("channel count was checked"),
                    };
                    data.extend_from_slice(&rgba);
                }
                data
            }
        };

        Ok(Texture { width, height, data })
    }

    pub fn load_image_from_memory(bytes: &[u8]) -> Result<Texture> {
        let image = image::load_from_memory(bytes).context(ImageDecodeErr)?;
        let rgba = image.into_rgba8();

        Ok(Texture {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Texture {
        let pixel_count = width as usize * height as usize;
        Texture {
            width,
            height,
            data: color.repeat(pixel_count),
        }
    }

    pub fn white() -> Texture {
        Texture::solid(1, 1, WHITE)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_hash(&self) -> ContentHash {
        texture_hash(false, self.width, self.height, 1, &self.data)
    }
}

/// A stack of equally sized RGBA8 layers, sampled as a single array texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureArray {
    width: u32,
    height: u32,
    limit: u32,
    data: Vec<u8>,
    layers: u32,
}

impl TextureArray {
    /// `limit` is the largest layer count the array may hold, usually the
    /// backend's `max_texture_array_layers`.
    pub fn new(width: u32, height: u32, limit: u32) -> Self {
        TextureArray {
            width,
            height,
            limit,
            data: Vec::new(),
            layers: 0,
        }
    }

    /// Appends a layer and returns its index.
    pub fn push_layer(&mut self, layer: &Texture) -> Result<u32> {
        ensure!(
            layer.width == self.width && layer.height == self.height,
            TextureLayerMismatchErr {
                width: layer.width,
                height: layer.height,
                expected_width: self.width,
                expected_height: self.height,
            }
        );
        ensure!(self.layers < self.limit, TextureArrayFullErr { limit: self.limit });

        self.data.extend_from_slice(&layer.data);
        self.layers += 1;

        Ok(self.layers - 1)
    }

    pub fn white() -> TextureArray {
        TextureArray {
            width: 1,
            height: 1,
            limit: 1,
            data: WHITE.to_vec(),
            layers: 1,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn layers(&self) -> u32 {
        self.layers
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// All layers back to back.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_hash(&self) -> ContentHash {
        texture_hash(true, self.width, self.height, self.layers, &self.data)
    }
}

fn texture_hash(array: bool, width: u32, height: u32, layers: u32, data: &[u8]) -> ContentHash {
    let mut hasher = ContentHasher::new();
    hasher
        .write_u8(u8::from(array))
        .write_u32(width)
        .write_u32(height)
        .write_u32(layers)
        .write_slice(data);
    hasher.finish()
}
