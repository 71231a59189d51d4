/// Primitive topology of a batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    /// Neutral topology of separator batches. Never drawn.
    Undefined,
}

impl Topology {
    /// Every drawable topology, in the order backends index their pipelines.
    pub const DRAWABLE: [Topology; 5] = [
        Topology::PointList,
        Topology::LineList,
        Topology::LineStrip,
        Topology::TriangleList,
        Topology::TriangleStrip,
    ];

    #[inline]
    pub fn is_strip(self) -> bool {
        matches!(self, Topology::LineStrip | Topology::TriangleStrip)
    }

    /// Vertices per primitive: 1 for points, 2 for lines, 3 for triangles,
    /// `None` for [`Topology::Undefined`].
    #[inline]
    pub fn vertices_per_primitive(self) -> Option<u32> {
        match self {
            Topology::PointList => Some(1),
            Topology::LineList | Topology::LineStrip => Some(2),
            Topology::TriangleList | Topology::TriangleStrip => Some(3),
            Topology::Undefined => None,
        }
    }

    /// Number of whole primitives described by `vertices` vertices.
    ///
    /// Lists: `vertices / n`. Strips: `vertices - (n - 1)`, zero when the
    /// strip is too short to form a primitive.
    pub fn primitive_count(self, vertices: u32) -> u32 {
        let Some(n) = self.vertices_per_primitive() else { return 0 };
        if self.is_strip() {
            vertices.saturating_sub(n - 1)
        } else {
            vertices / n
        }
    }

    /// Index into [`Topology::DRAWABLE`].
    #[inline]
    pub(crate) fn drawable_index(self) -> Option<usize> {
        Topology::DRAWABLE.iter().position(|&t| t == self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_primitive_counts() {
        assert_eq!(Topology::PointList.primitive_count(7), 7);
        assert_eq!(Topology::LineList.primitive_count(8), 4);
        assert_eq!(Topology::TriangleList.primitive_count(12), 4);
    }

    #[test]
    fn strip_primitive_counts() {
        assert_eq!(Topology::LineStrip.primitive_count(25), 24);
        assert_eq!(Topology::TriangleStrip.primitive_count(4), 2);
        assert_eq!(Topology::TriangleStrip.primitive_count(2), 0);
    }

    #[test]
    fn undefined_draws_nothing() {
        assert_eq!(Topology::Undefined.primitive_count(10), 0);
        assert_eq!(Topology::Undefined.drawable_index(), None);
    }
}
