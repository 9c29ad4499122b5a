//! RGB565 → RGB888 conversion.
//!
//! Source pixels are little-endian 16-bit words. Channels are extracted by
//! bit field and left-shifted to 8 bits: the low five bits land in the first
//! output byte, the middle six in the second, the high five in the third.

use fbmirror_types::{DisplayGeometry, Region, RGB_BYTES};

use crate::error::DisplayError;

/// Bytes per source pixel this converter understands.
pub const RGB565_BYTES: u32 = 2;

/// Expand one 16-bit pixel into three output bytes.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn rgb565_to_rgb888(value: u16) -> [u8; 3] {
    [
        ((value & 0x1F) << 3) as u8,
        (((value >> 5) & 0x3F) << 2) as u8,
        (((value >> 11) & 0x1F) << 3) as u8,
    ]
}

/// Convert `region` of the framebuffer in `src` into packed RGB888 in `dst`.
///
/// `region` is clamped to the visible window first; `dst` must hold exactly
/// `width * height * 3` bytes of the clamped region. Only pixels inside the
/// visible window are read.
pub fn convert_region(
    src: &[u8],
    geometry: &DisplayGeometry,
    region: Region,
    dst: &mut [u8],
) -> Result<(), DisplayError> {
    if geometry.bytes_per_pixel != RGB565_BYTES {
        return Err(DisplayError::UnsupportedFormat {
            bits_per_pixel: geometry.bytes_per_pixel * 8,
        });
    }
    let region = geometry.clamp(region);
    let expected = region.area() * RGB_BYTES;
    if dst.len() != expected {
        return Err(DisplayError::Destination {
            expected,
            actual: dst.len(),
        });
    }
    if region.is_empty() {
        return Ok(());
    }

    let last = geometry.byte_offset(region.x + region.width - 1, region.y + region.height - 1);
    if last + RGB565_BYTES as usize > src.len() {
        return Err(DisplayError::Read(format!(
            "source holds {} bytes, region needs {}",
            src.len(),
            last + RGB565_BYTES as usize
        )));
    }

    let src_row_len = region.width as usize * RGB565_BYTES as usize;
    let dst_row_len = region.width as usize * RGB_BYTES;
    for (row, out_row) in (0..region.height).zip(dst.chunks_exact_mut(dst_row_len)) {
        let start = geometry.byte_offset(region.x, region.y + row);
        let in_row = &src[start..start + src_row_len];
        for (px, out) in in_row
            .chunks_exact(RGB565_BYTES as usize)
            .zip(out_row.chunks_exact_mut(RGB_BYTES))
        {
            out.copy_from_slice(&rgb565_to_rgb888(u16::from_le_bytes([px[0], px[1]])));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(pixels: &[u16]) -> Vec<u8> {
        pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    #[test]
    fn channel_extraction() {
        assert_eq!(rgb565_to_rgb888(0x001F), [248, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0x07E0), [0, 252, 0]);
        assert_eq!(rgb565_to_rgb888(0xF800), [0, 0, 248]);
        assert_eq!(rgb565_to_rgb888(0x0000), [0, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0xFFFF), [248, 252, 248]);
    }

    #[test]
    fn extraction_law_holds_for_every_value() {
        for v in 0..=u16::MAX {
            let [r, g, b] = rgb565_to_rgb888(v);
            assert_eq!(u16::from(r), (v & 0x1F) << 3);
            assert_eq!(u16::from(g), ((v >> 5) & 0x3F) << 2);
            assert_eq!(u16::from(b), ((v >> 11) & 0x1F) << 3);
        }
    }

    #[test]
    fn converts_visible_window_of_panned_surface() {
        // 2x2 visible window, second page of a 2x4 virtual surface.
        let geometry = DisplayGeometry {
            width: 2,
            height: 2,
            virtual_width: 2,
            virtual_height: 4,
            x_offset: 0,
            y_offset: 2,
            bytes_per_pixel: 2,
            stride_pixels: 2,
        };
        let src = encode(&[0, 0, 0, 0, 0x001F, 0x07E0, 0xF800, 0xFFFF]);
        let mut dst = vec![0; 12];
        convert_region(&src, &geometry, geometry.visible(), &mut dst).unwrap();
        assert_eq!(
            dst,
            [248, 0, 0, 0, 252, 0, 0, 0, 248, 248, 252, 248]
        );
    }

    #[test]
    fn padded_stride_skips_padding() {
        let geometry = DisplayGeometry {
            stride_pixels: 3,
            ..DisplayGeometry::packed(2, 2, 2)
        };
        // Third pixel on each row is padding and must be ignored.
        let src = encode(&[0x001F, 0x001F, 0xFFFF, 0x07E0, 0x07E0, 0xFFFF]);
        let mut dst = vec![0; 12];
        convert_region(&src, &geometry, geometry.visible(), &mut dst).unwrap();
        assert_eq!(dst, [248, 0, 0, 248, 0, 0, 0, 252, 0, 0, 252, 0]);
    }

    #[test]
    fn sub_region_is_clamped() {
        let geometry = DisplayGeometry::packed(3, 1, 2);
        let src = encode(&[0x0000, 0x001F, 0x07E0]);
        let mut dst = vec![0; 6];
        convert_region(&src, &geometry, Region::new(1, 0, 10, 10), &mut dst).unwrap();
        assert_eq!(dst, [248, 0, 0, 0, 252, 0]);
    }

    #[test]
    fn rejects_wrong_depth() {
        let geometry = DisplayGeometry::packed(1, 1, 4);
        let mut dst = vec![0; 3];
        let err = convert_region(&[0; 4], &geometry, geometry.visible(), &mut dst).unwrap_err();
        assert!(matches!(
            err,
            DisplayError::UnsupportedFormat { bits_per_pixel: 32 }
        ));
    }

    #[test]
    fn rejects_short_source_and_bad_destination() {
        let geometry = DisplayGeometry::packed(2, 2, 2);
        let mut dst = vec![0; 12];
        assert!(matches!(
            convert_region(&[0; 6], &geometry, geometry.visible(), &mut dst),
            Err(DisplayError::Read(_))
        ));
        let mut small = vec![0; 5];
        assert!(matches!(
            convert_region(&[0; 8], &geometry, geometry.visible(), &mut small),
            Err(DisplayError::Destination { expected: 12, actual: 5 })
        ));
    }
}
