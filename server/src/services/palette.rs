// Palette Service
// Derives UI colors from the wallpaper image

use std::path::Path;

use image::{GenericImageView, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SAMPLE_SIZE: u32 = 64;
/// Quantization step per channel when bucketing pixels
const BUCKET_STEP: u8 = 32;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Failed to decode wallpaper: {0}")]
    Image(#[from] image::ImageError),

    #[error("Wallpaper has no pixels")]
    Empty,
}

/// Colors written to the `colors` setting as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub text: String,
}

pub fn derive_palette(path: &Path) -> Result<Palette, PaletteError> {
    let image = image::open(path)?;
    palette_from_image(&image)
}

pub fn palette_from_image(image: &image::DynamicImage) -> Result<Palette, PaletteError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PaletteError::Empty);
    }

    let sample = if width > SAMPLE_SIZE || height > SAMPLE_SIZE {
        image.thumbnail(SAMPLE_SIZE, SAMPLE_SIZE).to_rgb8()
    } else {
        image.to_rgb8()
    };
    let pixels: Vec<Rgb<u8>> = sample.pixels().copied().collect();
    if pixels.is_empty() {
        return Err(PaletteError::Empty);
    }

    let primary = dominant_color(&pixels);
    let secondary = darken(primary, 0.55);
    let text = if relative_luminance(primary) > 0.5 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    };

    Ok(Palette {
        primary: to_hex(primary),
        secondary: to_hex(secondary),
        text: to_hex(text),
    })
}

/// Average color of the most populated bucket
fn dominant_color(pixels: &[Rgb<u8>]) -> Rgb<u8> {
    let mut buckets: std::collections::HashMap<[u8; 3], (u64, [u64; 3])> =
        std::collections::HashMap::new();

    for pixel in pixels {
        let key = pixel.0.map(|channel| channel / BUCKET_STEP);
        let entry = buckets.entry(key).or_insert((0, [0; 3]));
        entry.0 += 1;
        for (sum, channel) in entry.1.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    let (count, sums) = buckets
        .into_values()
        .max_by_key(|(count, _)| *count)
        .unwrap_or((1, [0; 3]));

    Rgb(sums.map(|sum| (sum / count) as u8))
}

fn darken(color: Rgb<u8>, factor: f32) -> Rgb<u8> {
    Rgb(color.0.map(|channel| (f32::from(channel) * factor).round() as u8))
}

fn relative_luminance(color: Rgb<u8>) -> f32 {
    let [r, g, b] = color.0.map(|channel| f32::from(channel) / 255.0);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

fn to_hex(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}
