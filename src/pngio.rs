use crate::error::Result;
use std::io::Cursor;

/// The signature that all PNG files start with.
pub(crate) const PNG_SIGNATURE: &[u8] =
    &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Reads the width and height declared in a PNG file's header, without
/// decoding any pixel data.  Returns an encoding error if the data is empty
/// or is not a PNG file.
pub fn png_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.is_empty() {
        encoding_error!("PNG payload is empty");
    }
    if !data.starts_with(PNG_SIGNATURE) {
        encoding_error!("payload is not a PNG file");
    }
    let mut decoder = png::Decoder::new(Cursor::new(data));
    let info = match decoder.read_header_info() {
        Ok(info) => info,
        Err(err) => encoding_error!("unreadable PNG header: {}", err),
    };
    Ok((info.width, info.height))
}

/// Checks that `data` is a PNG file exactly `edge` pixels on each side.
pub(crate) fn check_square_png(data: &[u8], edge: u32) -> Result<()> {
    let (width, height) = png_dimensions(data)?;
    if width != height {
        encoding_error!("PNG is not square ({}x{})", width, height);
    }
    if width != edge {
        encoding_error!("PNG has wrong dimensions \
                         ({}x{} instead of {}x{})",
                        width,
                        height,
                        edge,
                        edge);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("PNG header");
        let pixels = vec![0u8; (width * height * 4) as usize];
        writer.write_image_data(&pixels).expect("PNG data");
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn reads_header_dimensions() {
        let data = blank_png(24, 12);
        assert_eq!(png_dimensions(&data).unwrap(), (24, 12));
    }

    #[test]
    fn rejects_non_png() {
        assert!(matches!(png_dimensions(b"GIF89a"), Err(Error::Encoding(_))));
        assert!(matches!(png_dimensions(&[]), Err(Error::Encoding(_))));
    }

    #[test]
    fn square_check() {
        assert!(check_square_png(&blank_png(32, 32), 32).is_ok());
        assert!(matches!(check_square_png(&blank_png(32, 16), 32),
                         Err(Error::Encoding(_))));
        assert!(matches!(check_square_png(&blank_png(16, 16), 32),
                         Err(Error::Encoding(_))));
    }
}
