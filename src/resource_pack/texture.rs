//! Texture loading and animation metadata.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Decoded texture image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data (4 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A solid texture, handy for building packs in code.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::new(width, height, pixels)
    }

    /// Whether this image looks like a vertical strip of animation frames.
    pub fn is_animated_strip(&self) -> bool {
        is_animated_strip(self.width, self.height)
    }

    /// Any pixel with alpha below 255. A trailing partial pixel is ignored.
    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks_exact(4).any(|pixel| pixel[3] < 255)
    }
}

/// A texture taller than it is wide is treated as an animation strip.
pub fn is_animated_strip(width: u32, height: u32) -> bool {
    height > width
}

/// Decode PNG bytes.
pub fn load_texture_from_bytes(data: &[u8]) -> Result<TextureData> {
    let img = image::load_from_memory(data)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureData::new(width, height, rgba.into_raw()))
}

/// Animation settings from a `.png.mcmeta` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationMeta {
    /// Ticks per frame.
    #[serde(default)]
    pub frametime: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    /// Frame height in pixels; frames are square when absent.
    #[serde(default)]
    pub height: Option<u32>,
    /// Explicit frame order.
    #[serde(default)]
    pub frames: Option<Vec<AnimationFrame>>,
    #[serde(default)]
    pub interpolate: bool,
}

/// One entry of an explicit frame list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationFrame {
    Index(u32),
    Timed {
        index: u32,
        #[serde(default)]
        time: Option<u32>,
    },
}

impl AnimationFrame {
    pub fn index(&self) -> u32 {
        match *self {
            AnimationFrame::Index(i) => i,
            AnimationFrame::Timed { index, .. } => index,
        }
    }
}

impl AnimationMeta {
    pub fn frame_time(&self) -> u32 {
        self.frametime.unwrap_or(1).max(1)
    }

    /// Height of one frame for a strip of the given size.
    pub fn frame_height(&self, texture: &TextureData) -> u32 {
        self.height.unwrap_or(texture.width).max(1)
    }

    /// Frames stored in the strip.
    pub fn frame_count(&self, texture: &TextureData) -> u32 {
        (texture.height / self.frame_height(texture)).max(1)
    }

    /// `(frame index, duration in ticks)` in playback order.
    pub fn frame_sequence(&self, texture: &TextureData) -> Vec<(u32, u32)> {
        let default_time = self.frame_time();
        match &self.frames {
            Some(frames) => frames
                .iter()
                .map(|frame| match *frame {
                    AnimationFrame::Index(i) => (i, default_time),
                    AnimationFrame::Timed { index, time } => (index, time.unwrap_or(default_time)),
                })
                .collect(),
            None => (0..self.frame_count(texture)).map(|i| (i, default_time)).collect(),
        }
    }
}

/// Parse `.png.mcmeta` contents. A file without an `animation` section yields
/// default settings.
pub fn parse_mcmeta(data: &[u8]) -> Result<AnimationMeta> {
    #[derive(Deserialize)]
    struct McMeta {
        #[serde(default)]
        animation: Option<AnimationMeta>,
    }

    let meta: McMeta = serde_json::from_slice(data)?;
    Ok(meta.animation.unwrap_or_default())
}
