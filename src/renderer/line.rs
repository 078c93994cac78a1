//! Grid line instances and the bounded pool they are drawn into

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::consts::LINE_SPRITE_WIDTH;
use crate::heading_angle;

/// One stretched line sprite: placed at its midpoint, rotated to its heading,
/// scaled along the heading by length and across it by thickness
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineSegment {
    pub center: [f32; 2],
    /// x: length in sprite widths, y: thickness
    pub scale: [f32; 2],
    /// Heading in radians
    pub rotation: f32,
    pub color: [f32; 4],
}

impl LineSegment {
    pub fn between(start: Vec2, end: Vec2, thickness: f32, color: [f32; 4]) -> Self {
        let heading = end - start;
        let center = (start + end) * 0.5;
        Self {
            center: center.to_array(),
            scale: [heading.length() / LINE_SPRITE_WIDTH, thickness],
            rotation: heading_angle(heading),
            color,
        }
    }

    /// World-space length of the segment
    pub fn length(&self) -> f32 {
        self.scale[0] * LINE_SPRITE_WIDTH
    }

    pub fn start(&self) -> Vec2 {
        let dir = Vec2::from_angle(self.rotation);
        Vec2::from(self.center) - dir * self.length() * 0.5
    }

    pub fn end(&self) -> Vec2 {
        let dir = Vec2::from_angle(self.rotation);
        Vec2::from(self.center) + dir * self.length() * 0.5
    }

    /// Per-instance buffer layout
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineSegment>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Fixed number of line instances, refilled in draw order every frame.
///
/// Segments pushed past capacity are dropped: an undersized pool draws an
/// incomplete grid rather than growing.
#[derive(Debug, Clone, Default)]
pub struct LinePool {
    segments: Vec<LineSegment>,
    cursor: usize,
    requested: usize,
}

impl LinePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            segments: vec![LineSegment::zeroed(); capacity],
            cursor: 0,
            requested: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.segments.len()
    }

    /// Start a new frame; previous contents are overwritten in order
    pub fn begin_frame(&mut self) {
        self.cursor = 0;
        self.requested = 0;
    }

    /// Returns false if the segment did not fit
    pub fn push(&mut self, segment: LineSegment) -> bool {
        self.requested += 1;
        match self.segments.get_mut(self.cursor) {
            Some(slot) => {
                *slot = segment;
                self.cursor += 1;
                true
            }
            None => false,
        }
    }

    /// Segments drawn this frame
    pub fn segments(&self) -> &[LineSegment] {
        &self.segments[..self.cursor]
    }

    /// Raw bytes of this frame's segments, ready for an instance buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.segments())
    }

    /// Segments requested this frame, including dropped ones
    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn dropped(&self) -> usize {
        self.requested.saturating_sub(self.capacity())
    }

    /// Free all instances
    pub fn release(&mut self) {
        self.segments = Vec::new();
        self.begin_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_between() {
        let seg = LineSegment::between(Vec2::new(0.0, 0.0), Vec2::new(0.0, 4.0), 0.03, [1.0; 4]);
        assert_eq!(seg.center, [0.0, 2.0]);
        assert!((seg.scale[0] - 4.0 / LINE_SPRITE_WIDTH).abs() < 1e-6);
        assert_eq!(seg.scale[1], 0.03);
        assert!((seg.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((seg.length() - 4.0).abs() < 1e-6);
        assert!(seg.end().distance(Vec2::new(0.0, 4.0)) < 1e-5);
        assert!(seg.start().distance(Vec2::ZERO) < 1e-5);
    }

    #[test]
    fn test_pool_truncates_overflow() {
        let mut pool = LinePool::with_capacity(3);
        let seg = LineSegment::between(Vec2::ZERO, Vec2::X, 0.01, [1.0; 4]);
        for _ in 0..5 {
            pool.push(seg);
        }
        assert_eq!(pool.segments().len(), 3);
        assert_eq!(pool.requested(), 5);
        assert_eq!(pool.dropped(), 2);

        pool.begin_frame();
        assert!(pool.segments().is_empty());
        assert_eq!(pool.dropped(), 0);
    }

    #[test]
    fn test_released_pool_accepts_nothing() {
        let mut pool = LinePool::with_capacity(2);
        pool.release();
        let seg = LineSegment::between(Vec2::ZERO, Vec2::X, 0.01, [1.0; 4]);
        assert!(!pool.push(seg));
        assert_eq!(pool.capacity(), 0);
    }

    #[test]
    fn test_instance_layout_matches_struct() {
        let layout = LineSegment::desc();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.len(), 4);
        assert_eq!(layout.attributes[3].offset, 20);
        let pool = LinePool::with_capacity(2);
        assert!(pool.as_bytes().is_empty());
    }
}
