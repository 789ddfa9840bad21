//! PNG conversion to and from `f32` arrays

use image::{ImageBuffer, Rgba};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use std::path::Path;

use crate::io::configuration::COVERED_ALPHA;
use crate::io::error::{PatchError, Result};
use crate::tiling::reassemble::is_undefined;

/// Load an image as grayscale intensities in `[0, 1]`, shaped `(height, width)`
///
/// # Errors
///
/// Returns `ImageLoad` if the file cannot be opened or decoded.
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<Array2<f32>> {
    let path_buf = path.as_ref().to_path_buf();
    let img = image::open(&path_buf).map_err(|e| PatchError::ImageLoad {
        path: path_buf,
        source: e,
    })?;
    let luma = img.to_luma8();

    let (width, height) = (luma.width() as usize, luma.height() as usize);
    let mut data = Array2::zeros((height, width));
    for (x, y, pixel) in luma.enumerate_pixels() {
        let [level] = pixel.0;
        if let Some(cell) = data.get_mut((y as usize, x as usize)) {
            *cell = f32::from(level) / 255.0;
        }
    }
    Ok(data)
}

/// Export a reconstruction as an RGBA PNG
///
/// Values are clamped to `[0, 1]` and written as gray levels. Undefined (NaN)
/// cells are fully transparent.
///
/// # Errors
///
/// Returns an error if:
/// - The map is too large for the PNG dimensions
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_score_map<S, P>(map: &ArrayBase<S, Ix2>, output_path: P) -> Result<()>
where
    S: Data<Elem = f32>,
    P: AsRef<Path>,
{
    let output_path = output_path.as_ref();
    let (height, width) = map.dim();
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(crate::io::error::invalid_geometry(
            "map",
            &format!("{height}x{width}"),
            &"too large for PNG export",
        ));
    };

    let mut img = ImageBuffer::new(width, height);
    for ((row, col), &value) in map.indexed_iter() {
        let pixel = if is_undefined(value) {
            Rgba([0, 0, 0, 0])
        } else {
            let level = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgba([level, level, level, COVERED_ALPHA])
        };
        img.put_pixel(col as u32, row as u32, pixel);
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PatchError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    img.save(output_path)
        .map_err(|e| PatchError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
