//! Decoding of raw PDF image XObject streams into displayable rasters.
//!
//! JPEG (`DCTDecode`) and JPEG2000 (`JPXDecode`) streams are handed to the
//! `image` crate as-is. `FlateDecode` streams are inflated and, like
//! unfiltered streams, interpreted as raw pixel rows according to the
//! declared colour space and bit depth.

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Read;

/// Decode the content of an image XObject stream into a [`DynamicImage`].
///
/// Errors are plain strings; the caller wraps them with page/image context.
pub(crate) fn decode_image_stream(
    document: &Document,
    stream: &Stream,
) -> Result<DynamicImage, String> {
    let content = &stream.content;

    match first_filter_name(&stream.dict).as_deref() {
        Some("DCTDecode") => image::load_from_memory_with_format(content, ImageFormat::Jpeg)
            .map_err(|e| format!("JPEG decode failed: {e}")),
        Some("JPXDecode") => {
            // JPEG2000 — best effort via format sniffing.
            image::load_from_memory(content).map_err(|e| format!("JPEG2000 decode failed: {e}"))
        }
        Some("FlateDecode") => {
            let mut inflated = Vec::new();
            ZlibDecoder::new(content.as_slice())
                .read_to_end(&mut inflated)
                .map_err(|e| format!("zlib inflate failed: {e}"))?;
            raster_from_raw(document, &stream.dict, &inflated)
        }
        None => raster_from_raw(document, &stream.dict, content),
        Some(other) => Err(format!("unsupported filter {other}")),
    }
}

/// Interpret `data` as raw pixel rows according to the stream dictionary's
/// `/ColorSpace` and `/BitsPerComponent`. Only 8 bits per component is
/// supported; narrower depths (image masks, palettes) are rejected.
fn raster_from_raw(
    document: &Document,
    dict: &Dictionary,
    data: &[u8],
) -> Result<DynamicImage, String> {
    let width = dict_u32(dict, b"Width").ok_or("missing /Width")?;
    let height = dict_u32(dict, b"Height").ok_or("missing /Height")?;
    let bits = dict_u32(dict, b"BitsPerComponent").unwrap_or(8);

    if bits != 8 {
        return Err(format!("unsupported bit depth {bits}"));
    }

    let pixels = (width as usize) * (height as usize);
    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .map(|obj| color_space_name(document, obj))
        .unwrap_or_default();

    match color_space.as_str() {
        "DeviceRGB" | "CalRGB" => {
            let expected = pixels * 3;
            if data.len() < expected {
                return Err(format!(
                    "RGB data too short: {} bytes, expected {expected}",
                    data.len()
                ));
            }
            RgbImage::from_raw(width, height, data[..expected].to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "RGB buffer construction failed".into())
        }
        "DeviceGray" | "CalGray" => {
            if data.len() < pixels {
                return Err(format!(
                    "grayscale data too short: {} bytes, expected {pixels}",
                    data.len()
                ));
            }
            GrayImage::from_raw(width, height, data[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| "grayscale buffer construction failed".into())
        }
        "DeviceCMYK" => {
            let expected = pixels * 4;
            if data.len() < expected {
                return Err(format!(
                    "CMYK data too short: {} bytes, expected {expected}",
                    data.len()
                ));
            }
            let mut rgb = Vec::with_capacity(pixels * 3);
            for chunk in data[..expected].chunks_exact(4) {
                let k = f32::from(chunk[3]) / 255.0;
                for component in &chunk[..3] {
                    let value = (1.0 - f32::from(*component) / 255.0) * (1.0 - k);
                    rgb.push((value * 255.0) as u8);
                }
            }
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "CMYK conversion failed".into())
        }
        "ICCBased" => {
            // The ICC profile itself is not interpreted; guess the component
            // count from the data size.
            if data.len() >= pixels * 3 {
                RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| "RGB buffer construction failed".into())
            } else if data.len() >= pixels {
                GrayImage::from_raw(width, height, data[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| "grayscale buffer construction failed".into())
            } else {
                Err("ICCBased data shorter than one component per pixel".into())
            }
        }
        other if other.is_empty() => Err("missing /ColorSpace".into()),
        other => Err(format!("unsupported colour space {other}")),
    }
}

// ── Dictionary helpers ────────────────────────────────────────────────────────

/// First name of the `/Filter` entry, which may be a single name or an array.
fn first_filter_name(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Array(filters) => filters.first().and_then(|f| match f {
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }),
        _ => None,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .and_then(|value| u32::try_from(value).ok())
}

/// Resolve a `/ColorSpace` value to its family name. The value may be a name,
/// a reference, or an array such as `[/ICCBased 12 0 R]`.
fn color_space_name(document: &Document, obj: &Object) -> String {
    match obj {
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Reference(id) => document
            .get_object(*id)
            .map(|resolved| color_space_name(document, resolved))
            .unwrap_or_default(),
        Object::Array(items) => items
            .first()
            .map(|first| color_space_name(document, first))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
