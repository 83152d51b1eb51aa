//! Indexed PNG (color type 3) encoding.
//!
//! Tiles use a five-entry palette, so the indexed form is both smaller and
//! cheaper to produce than RGBA: one byte per pixel, palette written once
//! in PLTE/tRNS.

use std::io::Write;

/// Create an indexed PNG from a palette and per-pixel palette indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> Result<Vec<u8>, String> {
    if indices.len() != width * height {
        return Err(format!(
            "index buffer is {} bytes, expected {}x{}",
            indices.len(),
            width,
            height
        ));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth (8 bits per palette index)
    ihdr_data.push(3); // color type 3 = indexed
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // PLTE chunk
    let mut plte_data = Vec::with_capacity(palette.len() * 3);
    for (r, g, b, _) in palette {
        plte_data.push(*r);
        plte_data.push(*g);
        plte_data.push(*b);
    }
    write_chunk(&mut png, b"PLTE", &plte_data);

    // tRNS chunk - only if any color has alpha < 255
    let has_transparency = palette.iter().any(|(_, _, _, a)| *a < 255);
    if has_transparency {
        let trns_data: Vec<u8> = palette.iter().map(|(_, _, _, a)| *a).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    // IDAT chunk
    let idat_data = deflate_idat_indexed(indices, width, height)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Deflate indexed image data for the IDAT chunk.
fn deflate_idat_indexed(
    indices: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, std::io::Error> {
    // Each scanline is a filter byte (0 = none) followed by width indices.
    let mut uncompressed = Vec::with_capacity(height * (1 + width));
    for y in 0..height {
        uncompressed.push(0);
        let row_start = y * width;
        uncompressed.extend_from_slice(&indices[row_start..row_start + width]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

/// Write a PNG chunk: length, type, data, CRC.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let crc_data = [chunk_type.as_slice(), data].concat();
    png.extend_from_slice(&crc32fast::hash(&crc_data).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: [(u8, u8, u8, u8); 3] = [(0, 0, 0, 0), (255, 0, 0, 255), (0, 255, 0, 255)];

    #[test]
    fn test_create_png_indexed() {
        let indices = [0u8, 1, 2, 1];
        let png = create_png_indexed(2, 2, &PALETTE, &indices).unwrap();

        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        // IHDR: width and height at fixed offsets, color type 3.
        assert_eq!(&png[16..20], &2u32.to_be_bytes());
        assert_eq!(&png[20..24], &2u32.to_be_bytes());
        assert_eq!(png[25], 3);
    }

    #[test]
    fn test_trns_present_with_transparency() {
        let png = create_png_indexed(1, 1, &PALETTE, &[0]).unwrap();
        assert!(png.windows(4).any(|w| w == b"tRNS"));

        let opaque = [(255u8, 0u8, 0u8, 255u8)];
        let png = create_png_indexed(1, 1, &opaque, &[0]).unwrap();
        assert!(!png.windows(4).any(|w| w == b"tRNS"));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        assert!(create_png_indexed(2, 2, &PALETTE, &[0, 1]).is_err());
    }
}
