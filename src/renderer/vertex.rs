//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Opaque color from a 0xRRGGBB literal
pub const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Colors for game elements
pub mod colors {
    use super::rgb;

    pub const SKY_TOP: [f32; 4] = rgb(0x74b9ff);
    pub const SKY_BOTTOM: [f32; 4] = rgb(0xffc300);
    pub const OUTLINE: [f32; 4] = rgb(0x000000);
    pub const AVATAR_BODY: [f32; 4] = rgb(0xffd700);
    pub const AVATAR_TRIANGLE: [f32; 4] = rgb(0xd32f2f);
    pub const GEM_BLUE: [f32; 4] = rgb(0x1976d2);
    pub const GEM_GREEN: [f32; 4] = rgb(0x388e3c);
    pub const GEM_PURPLE: [f32; 4] = rgb(0x8e24aa);
    pub const PLATFORM: [f32; 4] = rgb(0xd2a679);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_channels() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb(0x00ff00), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(colors::OUTLINE, [0.0, 0.0, 0.0, 1.0]);
    }
}
