//! Image-producing tools and artifact housekeeping.
//!
//! Rendered images are written through the [`ResourceStore`]; the tool
//! result carries the stored path plus the PNG as base64, so the model can
//! hand either back to the user.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};

use super::Tool;
use crate::resources::ResourceStore;

const MAX_DIMENSION: u32 = 2000;

/// Render a sine wave plot as a PNG.
pub struct DrawSineWave;

#[async_trait]
impl Tool for DrawSineWave {
    fn name(&self) -> &str {
        "draw_sine_wave"
    }

    fn description(&self) -> &str {
        "Draw a sine wave with the given amplitude and frequency. Renders a PNG plot, stores it, and returns the saved path."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amplitude": {
                    "type": "number",
                    "description": "Amplitude of the sine wave (default: 1.0)"
                },
                "frequency": {
                    "type": "number",
                    "description": "Frequency of the sine wave (default: 1.0)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value, store: &ResourceStore) -> anyhow::Result<String> {
        let amplitude = args["amplitude"].as_f64().unwrap_or(1.0);
        let frequency = args["frequency"].as_f64().unwrap_or(1.0);
        if !amplitude.is_finite() || !frequency.is_finite() {
            return Err(anyhow::anyhow!("amplitude and frequency must be finite"));
        }

        let img = render_sine_wave(amplitude, frequency, 1000, 600);
        let png = encode_png(&img)?;
        let handle = store.store("sine_wave", "png", &png)?;

        Ok(json!({
            "saved_path": handle.path,
            "base64_image": base64::engine::general_purpose::STANDARD.encode(&png),
            "width": img.width(),
            "height": img.height(),
        })
        .to_string())
    }
}

/// Plot y = amplitude * sin(2π * frequency * x) over x in [0, 10].
fn render_sine_wave(amplitude: f64, frequency: f64, width: u32, height: u32) -> RgbImage {
    let background = Rgb([255u8, 255, 255]);
    let axis = Rgb([200u8, 200, 200]);
    let curve = Rgb([31u8, 119, 180]);

    let mut img = RgbImage::from_pixel(width, height, background);

    let center = height as f64 / 2.0;
    for x in 0..width {
        img.put_pixel(x, center as u32, axis);
    }

    // Vertical scale: the wave peaks 20px inside the image edge.
    let scale = (center - 20.0) / amplitude.abs().max(1e-9);

    let y_at = |x: u32| -> u32 {
        let t = x as f64 / width as f64 * 10.0;
        let y = amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin();
        (center - y * scale).clamp(0.0, height as f64 - 1.0) as u32
    };

    let mut prev = y_at(0);
    for x in 0..width {
        let cur = y_at(x);
        // Fill the vertical span to the previous column so the curve is
        // continuous at steep slopes.
        let (lo, hi) = if prev <= cur { (prev, cur) } else { (cur, prev) };
        for y in lo..=hi {
            img.put_pixel(x, y, curve);
        }
        prev = cur;
    }

    img
}

/// Render a horizontal color gradient as a PNG.
pub struct GenerateColorGradient;

#[async_trait]
impl Tool for GenerateColorGradient {
    fn name(&self) -> &str {
        "generate_color_gradient"
    }

    fn description(&self) -> &str {
        "Generate a horizontal color gradient image between two RGB colors. Stores the PNG and returns the saved path."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_color": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "RGB start color, e.g. [255, 0, 0]"
                },
                "end_color": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "RGB end color, e.g. [0, 0, 255]"
                },
                "width": {
                    "type": "integer",
                    "description": "Image width in pixels (default: 300)"
                },
                "height": {
                    "type": "integer",
                    "description": "Image height in pixels (default: 100)"
                }
            },
            "required": ["start_color", "end_color"]
        })
    }

    async fn execute(&self, args: Value, store: &ResourceStore) -> anyhow::Result<String> {
        let start = parse_rgb(&args["start_color"], "start_color")?;
        let end = parse_rgb(&args["end_color"], "end_color")?;
        let width = parse_dimension(&args["width"], 300)?;
        let height = parse_dimension(&args["height"], 100)?;

        let img = render_gradient(start, end, width, height);
        let png = encode_png(&img)?;
        let handle = store.store("gradient", "png", &png)?;

        Ok(json!({
            "saved_path": handle.path,
            "base64_image": base64::engine::general_purpose::STANDARD.encode(&png),
            "width": width,
            "height": height,
        })
        .to_string())
    }
}

fn render_gradient(start: [u8; 3], end: [u8; 3], width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _y| {
        let fraction = x as f64 / width as f64;
        let channel = |i: usize| {
            (start[i] as f64 + (end[i] as f64 - start[i] as f64) * fraction).round() as u8
        };
        Rgb([channel(0), channel(1), channel(2)])
    })
}

fn parse_rgb(value: &Value, name: &str) -> anyhow::Result<[u8; 3]> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("'{}' must be an [r, g, b] array", name))?;
    if items.len() != 3 {
        return Err(anyhow::anyhow!("'{}' must have exactly 3 components", name));
    }
    let mut rgb = [0u8; 3];
    for (i, item) in items.iter().enumerate() {
        let component = item
            .as_u64()
            .filter(|&v| v <= 255)
            .ok_or_else(|| anyhow::anyhow!("'{}' components must be integers in 0..=255", name))?;
        rgb[i] = component as u8;
    }
    Ok(rgb)
}

fn parse_dimension(value: &Value, default: u32) -> anyhow::Result<u32> {
    if value.is_null() {
        return Ok(default);
    }
    value
        .as_u64()
        .filter(|&v| v >= 1 && v <= MAX_DIMENSION as u64)
        .map(|v| v as u32)
        .ok_or_else(|| anyhow::anyhow!("dimensions must be integers in 1..={}", MAX_DIMENSION))
}

fn encode_png(img: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// List stored artifacts.
pub struct ListArtifacts;

#[async_trait]
impl Tool for ListArtifacts {
    fn name(&self) -> &str {
        "list_artifacts"
    }

    fn description(&self) -> &str {
        "List all generated artifacts (images and other files) with their paths."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value, store: &ResourceStore) -> anyhow::Result<String> {
        let paths: Vec<String> = store
            .list()?
            .into_iter()
            .map(|h| h.path.display().to_string())
            .collect();
        Ok(serde_json::to_string(&paths)?)
    }
}

/// Delete all stored artifacts.
pub struct ClearArtifacts;

#[async_trait]
impl Tool for ClearArtifacts {
    fn name(&self) -> &str {
        "clear_artifacts"
    }

    fn description(&self) -> &str {
        "Delete all generated artifacts. Returns the number of files removed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value, store: &ResourceStore) -> anyhow::Result<String> {
        let removed = store.clear()?;
        Ok(format!("Removed {} artifact(s)", removed))
    }
}
