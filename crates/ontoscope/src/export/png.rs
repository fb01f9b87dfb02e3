use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg,
};

use super::Error;

/// Rasterizes an exported SVG document into a `data:image/png;base64,` URL.
///
/// `scale` multiplies the document's own width and height.
///
/// # Errors
///
/// Returns [`Error::Render`] for a non-positive scale, an unparsable
/// document, or an empty output image.
pub fn to_data_url(svg: &str, scale: f32) -> Result<String, Error> {
    let png = to_png(svg, scale)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Rasterizes an exported SVG document into PNG bytes.
///
/// # Errors
///
/// See [`to_data_url`].
pub fn to_png(svg: &str, scale: f32) -> Result<Vec<u8>, Error> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Render(format!("invalid raster scale {scale}")));
    }

    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Render(format!("failed to parse SVG: {e}")))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Render(format!("cannot allocate a {width}x{height} image")))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    debug!(width = width, height = height; "Rasterized SVG");
    pixmap
        .encode_png()
        .map_err(|e| Error::Render(format!("failed to encode PNG: {e}")))
}
