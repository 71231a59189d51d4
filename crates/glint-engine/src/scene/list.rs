use crate::render::TextureId;

use super::{Topology, Vertex};

/// A contiguous run of vertices sharing `(topology, texture)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Batch {
    pub count: usize,
    pub topology: Topology,
    pub texture: Option<TextureId>,
}

impl Batch {
    #[inline]
    fn separator() -> Self {
        Self { count: 0, topology: Topology::Undefined, texture: None }
    }
}

/// One GPU draw derived from a [`Batch`] during submission.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub topology: Topology,
    /// `None` binds the backend's 1×1 opaque white texture.
    pub texture: Option<TextureId>,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub primitive_count: u32,
}

/// Vertices and batches accumulated between two submissions.
///
/// Insertion order is draw order. Batch counts always sum to the vertex
/// count. [`clear`](Self::clear) keeps the allocations, so a list reused
/// every frame stops allocating once warmed up.
#[derive(Debug, Default, Clone)]
pub struct RenderList {
    vertices: Vec<Vertex>,
    batches: Vec<Batch>,
}

impl RenderList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list with room for `vertices` vertices.
    #[inline]
    pub fn with_capacity(vertices: usize) -> Self {
        Self { vertices: Vec::with_capacity(vertices), batches: Vec::new() }
    }

    /// Empties the list. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.batches.clear();
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends a single vertex of a list topology.
    ///
    /// # Panics
    /// Panics (debug only) for strip topologies; strips must go through
    /// [`add_vertices`](Self::add_vertices) so they get terminated.
    pub fn add_vertex(&mut self, vertex: Vertex, topology: Topology) {
        debug_assert!(
            !topology.is_strip(),
            "add_vertex: use add_vertices to draw line/triangle strips"
        );
        self.extend_batch(1, topology, None);
        self.vertices.push(vertex);
    }

    /// Appends `vertices` as one contiguous run.
    ///
    /// The run joins the last batch when topology and texture match;
    /// otherwise it opens a new batch. Strips are always followed by an
    /// empty separator batch so the next run can never continue them, even
    /// with identical topology and texture.
    pub fn add_vertices(
        &mut self,
        vertices: &[Vertex],
        topology: Topology,
        texture: Option<TextureId>,
    ) {
        if vertices.is_empty() {
            return;
        }

        self.extend_batch(vertices.len(), topology, texture);
        self.vertices.extend_from_slice(vertices);

        if topology.is_strip() {
            self.batches.push(Batch::separator());
        }
    }

    /// Converts the batches into draw calls with running vertex offsets.
    ///
    /// Empty batches and batches without a drawable topology are skipped;
    /// the offset still advances past whatever vertices they hold.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        let mut calls = Vec::with_capacity(self.batches.len());
        let mut offset = 0usize;

        for batch in &self.batches {
            let first = offset;
            offset += batch.count;

            if batch.count == 0 {
                continue;
            }
            let count = batch.count as u32;
            let primitives = batch.topology.primitive_count(count);
            if primitives == 0 {
                continue;
            }

            calls.push(DrawCall {
                topology: batch.topology,
                texture: batch.texture,
                first_vertex: first as u32,
                vertex_count: count,
                primitive_count: primitives,
            });
        }

        calls
    }

    fn extend_batch(&mut self, count: usize, topology: Topology, texture: Option<TextureId>) {
        match self.batches.last_mut() {
            Some(last) if last.topology == topology && last.texture == texture => {
                last.count += count;
            }
            _ => self.batches.push(Batch { count, topology, texture }),
        }
    }
}
