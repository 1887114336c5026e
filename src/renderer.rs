//! Row renderer: folds one 8-scanline strip of the embedded core's RGB
//! framebuffer into the adapter's 2bpp planar VRAM format.

/// Framebuffer width in pixels.
pub const FRAME_WIDTH: usize = 160;

/// Framebuffer height in pixels.
pub const FRAME_HEIGHT: usize = 144;

/// Rows of 8 scanlines covering the visible frame.
pub const VISIBLE_ROWS: usize = FRAME_HEIGHT / 8;

/// One rendered row: 20 tiles of 16 bytes (two interleaved bitplanes).
pub const VRAM_ROW_BYTES: usize = 320;

/// Folds a 24-bit RGB value into a 2-bit intensity index (0-3).
const INTENSITY_DIVISOR: u32 = 0x55_5555;

/// Render row `row` of `frame` into `vram`.
///
/// The buffer is rebuilt from scratch: each pixel's intensity index is
/// inverted (3 - value, so white maps to color 0) and OR-ed into the two
/// bitplanes of its 8x8 tile. Rows beyond the visible frame render all
/// zeros.
pub fn render_row(frame: &[u32], row: usize, vram: &mut [u8; VRAM_ROW_BYTES]) {
    vram.fill(0);
    if row >= VISIBLE_ROWS {
        return;
    }

    for y in 0..8 {
        let line = &frame[(row * 8 + y) * FRAME_WIDTH..][..FRAME_WIDTH];
        for (x, &rgb) in line.iter().enumerate() {
            let pixel = (rgb / INTENSITY_DIVISOR) ^ 3;
            let addr = x / 8 * 16 + y * 2;
            let shift = 7 - (x & 7);
            vram[addr] |= ((pixel & 1) as u8) << shift;
            vram[addr + 1] |= ((pixel >> 1 & 1) as u8) << shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render_row, FRAME_HEIGHT, FRAME_WIDTH, VRAM_ROW_BYTES};

    fn frame_of(rgb: u32) -> Vec<u32> {
        vec![rgb; FRAME_WIDTH * FRAME_HEIGHT]
    }

    #[test]
    fn all_white_renders_color_zero() {
        let frame = frame_of(0xFF_FFFF);
        let mut vram = [0xAAu8; VRAM_ROW_BYTES];
        render_row(&frame, 0, &mut vram);
        assert!(vram.iter().all(|&b| b == 0));
    }

    #[test]
    fn all_black_renders_color_three() {
        let frame = frame_of(0x00_0000);
        let mut vram = [0u8; VRAM_ROW_BYTES];
        render_row(&frame, 17, &mut vram);
        assert!(vram.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn mid_grays_set_one_plane_each() {
        // 0x555555 quantizes to 1, inverted to 2: high plane only.
        let frame = frame_of(0x55_5555);
        let mut vram = [0u8; VRAM_ROW_BYTES];
        render_row(&frame, 3, &mut vram);
        for pair in vram.chunks_exact(2) {
            assert_eq!(pair, [0x00, 0xFF]);
        }

        // 0xAAAAAA quantizes to 2, inverted to 1: low plane only.
        let frame = frame_of(0xAA_AAAA);
        render_row(&frame, 3, &mut vram);
        for pair in vram.chunks_exact(2) {
            assert_eq!(pair, [0xFF, 0x00]);
        }
    }

    #[test]
    fn single_pixel_lands_in_its_tile_planes() {
        let mut frame = frame_of(0xFF_FFFF);
        // Black pixel at x=75, y=21: row 2, scanline 5 of the strip,
        // tile 9, bit 4.
        frame[21 * FRAME_WIDTH + 75] = 0;
        let mut vram = [0u8; VRAM_ROW_BYTES];
        render_row(&frame, 2, &mut vram);

        let addr = 75 / 8 * 16 + (21 % 8) * 2;
        assert_eq!(vram[addr], 1 << (7 - 75 % 8));
        assert_eq!(vram[addr + 1], 1 << (7 - 75 % 8));
        for (i, &b) in vram.iter().enumerate() {
            if i != addr && i != addr + 1 {
                assert_eq!(b, 0, "stray bits at {i}");
            }
        }
    }

    #[test]
    fn out_of_range_row_renders_zeros() {
        let frame = frame_of(0);
        let mut vram = [0x55u8; VRAM_ROW_BYTES];
        render_row(&frame, 18, &mut vram);
        assert!(vram.iter().all(|&b| b == 0));
    }
}
