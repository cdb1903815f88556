use crate::assets::{ContentHash, ContentHasher};
use crate::engine::core::Vertex3D;
use crate::error::*;
use num_traits::{AsPrimitive, PrimInt};
use snafu::ensure;

/// The width of the integers in an index buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexWidth {
    U8,
    U16,
    U32,
}

impl IndexWidth {
    /// The smallest width that can still represent `max`. Values above `u32::MAX`
    /// have no index width.
    pub const fn for_max(max: u64) -> Option<IndexWidth> {
        if max <= u8::MAX as u64 {
            Some(IndexWidth::U8)
        } else if max <= u16::MAX as u64 {
            Some(IndexWidth::U16)
        } else if max <= u32::MAX as u64 {
            Some(IndexWidth::U32)
        } else {
            None
        }
    }

    pub const fn bytes(self) -> usize {
        match self {
            IndexWidth::U8 => 1,
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

/// Raw index data as it comes from a model loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Indices::U8(i) => i.len(),
            Indices::U16(i) => i.len(),
            Indices::U32(i) => i.len(),
            Indices::U64(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every index widened to 64 bits, in order.
    pub fn iter_u64(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        match self {
            Indices::U8(i) => Box::new(i.iter().map(|&i| u64::from(i))),
            Indices::U16(i) => Box::new(i.iter().map(|&i| u64::from(i))),
            Indices::U32(i) => Box::new(i.iter().map(|&i| u64::from(i))),
            Indices::U64(i) => Box::new(i.iter().copied()),
        }
    }

    pub fn max_value(&self) -> Option<u64> {
        self.iter_u64().max()
    }

    /// The width the data is currently stored in. 64-bit data can't be uploaded as is.
    pub fn width(&self) -> Option<IndexWidth> {
        match self {
            Indices::U8(_) => Some(IndexWidth::U8),
            Indices::U16(_) => Some(IndexWidth::U16),
            Indices::U32(_) => Some(IndexWidth::U32),
            Indices::U64(_) => None,
        }
    }

    /// Converts the indices to the smallest width that represents the largest index.
    ///
    /// The result only depends on the index values, never on the input width,
    /// so the same logical geometry always narrows to the same width.
    pub fn narrowed(&self) -> Result<Indices> {
        let max = self.max_value().unwrap_or(0);
        let width = IndexWidth::for_max(max).ok_or(RenderError::IndexTooWide { index: max })?;
        Ok(self.converted(width))
    }

    /// Stores the indices as 32-bit values. Fails if any index is too wide.
    pub fn widened(&self) -> Result<Indices> {
        let max = self.max_value().unwrap_or(0);
        ensure!(max <= u64::from(u32::MAX), IndexTooWideErr { index: max });
        Ok(self.converted(IndexWidth::U32))
    }

    pub(crate) fn converted(&self, width: IndexWidth) -> Indices {
        match self {
            Indices::U8(i) => convert(i, width),
            Indices::U16(i) => convert(i, width),
            Indices::U32(i) => convert(i, width),
            Indices::U64(i) => convert(i, width),
        }
    }

    /// The raw bytes of the index buffer in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Indices::U8(i) => i.as_slice(),
            Indices::U16(i) => bytemuck::cast_slice(i),
            Indices::U32(i) => bytemuck::cast_slice(i),
            Indices::U64(i) => bytemuck::cast_slice(i),
        }
    }
}

fn convert<T>(src: &[T], width: IndexWidth) -> Indices
where
    T: PrimInt + AsPrimitive<u8> + AsPrimitive<u16> + AsPrimitive<u32>,
{
    match width {
        IndexWidth::U8 => Indices::U8(src.iter().map(|i| i.as_()).collect()),
        IndexWidth::U16 => Indices::U16(src.iter().map(|i| i.as_()).collect()),
        IndexWidth::U32 => Indices::U32(src.iter().map(|i| i.as_()).collect()),
    }
}

impl From<Vec<u8>> for Indices {
    fn from(value: Vec<u8>) -> Self {
        Indices::U8(value)
    }
}

impl From<Vec<u16>> for Indices {
    fn from(value: Vec<u16>) -> Self {
        Indices::U16(value)
    }
}

impl From<Vec<u32>> for Indices {
    fn from(value: Vec<u32>) -> Self {
        Indices::U32(value)
    }
}

impl From<Vec<u64>> for Indices {
    fn from(value: Vec<u64>) -> Self {
        Indices::U64(value)
    }
}

/// Vertex and optional index data for one mesh, as produced by a model loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex3D>,
    indices: Option<Indices>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex3D>) -> Self {
        Geometry {
            vertices,
            indices: None,
        }
    }

    pub fn indexed(vertices: Vec<Vertex3D>, indices: impl Into<Indices>) -> Self {
        Geometry {
            vertices,
            indices: Some(indices.into()),
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> Option<&Indices> {
        self.indices.as_ref()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Indices::len)
    }

    /// Checks that there is something to draw and that every index points at a vertex.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.vertices.is_empty(), EmptyGeometryErr);

        let Some(indices) = &self.indices else {
            return Ok(());
        };
        ensure!(!indices.is_empty(), EmptyGeometryErr);

        let vertex_count = self.vertices.len();
        if let Some(index) = indices.iter_u64().find(|&i| i >= vertex_count as u64) {
            return IndexOutOfBoundsErr {
                index,
                vertex_count,
            }
            .fail();
        }

        Ok(())
    }

    /// Hashes the vertices first, then the indices.
    ///
    /// Indices are hashed in their canonical 64-bit form, so index data that only
    /// differs in its storage width still maps to the same hash.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        hasher.write_slice(&self.vertices);

        match &self.indices {
            None => {
                hasher.write_u8(0);
            }
            Some(indices) => {
                hasher.write_u8(1).write_u64(indices.len() as u64);
                for index in indices.iter_u64() {
                    hasher.write_u64(index);
                }
            }
        }

        hasher.finish()
    }

    /// Validates the geometry and returns the index data in the width it should be uploaded with.
    pub fn upload_indices(&self, narrow: bool) -> Result<Option<Indices>> {
        self.validate()?;

        self.indices
            .as_ref()
            .map(|indices| {
                if narrow {
                    indices.narrowed()
                } else {
                    indices.widened()
                }
            })
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn conversion_keeps_values_and_order() {
        let narrowed = Indices::U64(vec![3, 1, 2]).narrowed().unwrap();
        assert_eq!(narrowed, Indices::U8(vec![3, 1, 2]));

        let widened = Indices::U8(vec![3, 1, 2]).widened().unwrap();
        assert_eq!(widened, Indices::U32(vec![3, 1, 2]));
    }
}
