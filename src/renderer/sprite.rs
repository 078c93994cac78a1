//! Particle sprite instances

use bytemuck::{Pod, Zeroable};

use crate::sim::Particle;

/// A particle as the host renderer sees it
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleSprite {
    pub position: [f32; 2],
    pub scale: [f32; 2],
    pub rotation: f32,
    pub color: [f32; 4],
}

impl ParticleSprite {
    pub fn from_particle(particle: &Particle) -> Self {
        let [r, g, b, _] = particle.color;
        Self {
            position: particle.position.to_array(),
            scale: particle.scale.to_array(),
            rotation: particle.rotation,
            color: [r, g, b, particle.alpha],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleSprite>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Collect sprites for every live particle
pub fn particle_sprites<'a>(particles: impl Iterator<Item = &'a Particle>) -> Vec<ParticleSprite> {
    particles.map(ParticleSprite::from_particle).collect()
}

/// Colors for the neon palette
pub mod colors {
    pub const GRID: [f32; 4] = [0.12, 0.1, 0.55, 0.85];
    pub const BLACK_HOLE_SPRAY: [f32; 4] = [1.0, 0.35, 0.55, 1.0];
    pub const EXPLOSION: [f32; 4] = [1.0, 0.75, 0.3, 1.0];
    pub const PLAYER_TRAIL: [f32; 4] = [0.4, 0.9, 1.0, 1.0];
}
