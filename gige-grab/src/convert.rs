//! Conversion of raw frames to 8 bit RGB.
//!
//! Bayer mosaics are demosaiced with cubic interpolation by the `bayer`
//! crate. 16 bit samples are reduced to their most significant byte first.
use std::io::Cursor;

use ci2::{BayerTile, PixelFormat, RawFrame};

use crate::{Error, Result};

fn cfa(tile: BayerTile) -> Option<bayer::CFA> {
    match tile {
        BayerTile::RGGB => Some(bayer::CFA::RGGB),
        BayerTile::GRBG => Some(bayer::CFA::GRBG),
        BayerTile::GBRG => Some(bayer::CFA::GBRG),
        BayerTile::BGGR => Some(bayer::CFA::BGGR),
        BayerTile::None => None,
    }
}

/// Check that the buffer holds `height` rows of `stride` bytes.
fn check_frame(frame: &RawFrame) -> Result<()> {
    if frame.width == 0 || frame.height == 0 {
        return Err(Error::InvalidFrame {
            msg: format!("empty {}x{} frame", frame.width, frame.height),
        });
    }
    let row_bytes = frame.width as usize * frame.pixel_format.bits_per_pixel() as usize / 8;
    if (frame.stride as usize) < row_bytes {
        return Err(Error::InvalidFrame {
            msg: format!(
                "stride {} shorter than row of {row_bytes} bytes",
                frame.stride
            ),
        });
    }
    let needed = frame.stride as usize * frame.height as usize;
    if frame.data.len() < needed {
        return Err(Error::InvalidFrame {
            msg: format!(
                "{} bytes for {} rows of stride {}",
                frame.data.len(),
                frame.height,
                frame.stride
            ),
        });
    }
    Ok(())
}

/// Single channel samples as packed 8 bit rows.
fn packed_mono8(frame: &RawFrame) -> Vec<u8> {
    let w = frame.width as usize;
    let mut packed = Vec::with_capacity(w * frame.height as usize);
    for y in 0..frame.height {
        let row = frame.row(y);
        match frame.pixel_format {
            // Little endian, keep the most significant byte.
            PixelFormat::Mono16 | PixelFormat::Raw16 => {
                packed.extend(row[..w * 2].chunks_exact(2).map(|px| px[1]))
            }
            _ => packed.extend_from_slice(&row[..w]),
        }
    }
    packed
}

fn demosaic(frame: &RawFrame, cfa: bayer::CFA, out: &mut [u8]) -> Result<()> {
    // The demosaic code expects rows without padding.
    let mosaic = packed_mono8(frame);
    let mut dst = bayer::RasterMut::new(
        frame.width as usize,
        frame.height as usize,
        bayer::RasterDepth::Depth8,
        out,
    );
    bayer::run_demosaic(
        &mut Cursor::new(&mosaic),
        bayer::BayerDepth::Depth8,
        cfa,
        bayer::Demosaic::Cubic,
        &mut dst,
    )?;
    Ok(())
}

/// Convert a frame to an RGB image.
pub fn to_rgb8(frame: &RawFrame) -> Result<image::RgbImage> {
    check_frame(frame)?;
    let (w, h) = (frame.width, frame.height);
    let mut out = vec![0u8; w as usize * h as usize * 3];

    match (frame.pixel_format, cfa(frame.bayer_tile)) {
        (PixelFormat::Raw8 | PixelFormat::Raw16, Some(cfa)) => {
            demosaic(frame, cfa, &mut out)?;
        }
        (PixelFormat::Rgb8 | PixelFormat::Bgr8, _) => {
            let swap = frame.pixel_format == PixelFormat::Bgr8;
            for (y, dest) in out.chunks_exact_mut(w as usize * 3).enumerate() {
                dest.copy_from_slice(&frame.row(y as u32)[..w as usize * 3]);
                if swap {
                    for px in dest.chunks_exact_mut(3) {
                        px.swap(0, 2);
                    }
                }
            }
        }
        _ => {
            // Monochrome, or raw data without a color filter.
            for (dest, v) in out.chunks_exact_mut(3).zip(packed_mono8(frame)) {
                dest.fill(v);
            }
        }
    }

    image::RgbImage::from_raw(w, h, out).ok_or_else(|| Error::InvalidFrame {
        msg: format!("cannot create {w}x{h} image"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci2::HostTimingInfo;

    fn frame(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        bayer_tile: BayerTile,
        data: Vec<u8>,
    ) -> RawFrame {
        let stride = width * u32::from(pixel_format.bits_per_pixel()) / 8;
        RawFrame {
            width,
            height,
            stride,
            pixel_format,
            bayer_tile,
            data,
            device_timestamp: None,
            host_timing: HostTimingInfo {
                fno: 0,
                datetime: chrono::Utc::now(),
            },
        }
    }

    /// Mosaic of a uniform color, using the given tile arrangement.
    fn uniform_mosaic(tile: BayerTile, w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        // Index into `rgb` of each filter of the top-left tile.
        let filters = match tile {
            BayerTile::RGGB => [[0, 1], [1, 2]],
            BayerTile::GRBG => [[1, 0], [2, 1]],
            BayerTile::GBRG => [[1, 2], [0, 1]],
            BayerTile::BGGR => [[2, 1], [1, 0]],
            BayerTile::None => [[1, 1], [1, 1]],
        };
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                data.push(rgb[filters[(y % 2) as usize][(x % 2) as usize]]);
            }
        }
        data
    }

    fn assert_uniform(img: &image::RgbImage, rgb: [u8; 3]) {
        for (x, y, px) in img.enumerate_pixels() {
            for c in 0..3 {
                let diff = (i16::from(px.0[c]) - i16::from(rgb[c])).abs();
                assert!(diff <= 1, "pixel ({x},{y}) is {:?}, expected {rgb:?}", px.0);
            }
        }
    }

    #[test]
    fn uniform_bayer_recovers_color() {
        let rgb = [210, 120, 30];
        for tile in [
            BayerTile::RGGB,
            BayerTile::GRBG,
            BayerTile::GBRG,
            BayerTile::BGGR,
        ] {
            let f = frame(6, 4, PixelFormat::Raw8, tile, uniform_mosaic(tile, 6, 4, rgb));
            let img = to_rgb8(&f).unwrap();
            assert_eq!(img.dimensions(), (6, 4));
            assert_uniform(&img, rgb);
        }
    }

    #[test]
    fn odd_dimensions_keep_all_channels() {
        let tile = BayerTile::RGGB;
        let f = frame(5, 3, PixelFormat::Raw8, tile, uniform_mosaic(tile, 5, 3, [9, 8, 7]));
        let img = to_rgb8(&f).unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        // The last column and row have no blue sample of their own.
        assert_uniform(&img, [9, 8, 7]);
    }

    #[test]
    fn raw16_uses_high_byte() {
        let tile = BayerTile::GBRG;
        let rgb = [200, 100, 50];
        let data = uniform_mosaic(tile, 4, 4, rgb)
            .into_iter()
            .flat_map(|v| [0x7f, v])
            .collect();
        let img = to_rgb8(&frame(4, 4, PixelFormat::Raw16, tile, data)).unwrap();
        assert_uniform(&img, rgb);
    }

    #[test]
    fn padded_rows_are_skipped() {
        let tile = BayerTile::BGGR;
        let rgb = [40, 50, 60];
        let mut f = frame(4, 4, PixelFormat::Raw8, tile, Vec::new());
        f.stride = 6;
        f.data = uniform_mosaic(tile, 4, 4, rgb)
            .chunks_exact(4)
            .flat_map(|row| row.iter().copied().chain([255, 255]))
            .collect();
        assert_uniform(&to_rgb8(&f).unwrap(), rgb);
    }

    #[test]
    fn mono_is_replicated() {
        let f = frame(2, 1, PixelFormat::Mono8, BayerTile::None, vec![10, 20]);
        let img = to_rgb8(&f).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(img.get_pixel(1, 0).0, [20, 20, 20]);

        let f = frame(1, 1, PixelFormat::Mono16, BayerTile::None, vec![0x34, 0x12]);
        assert_eq!(to_rgb8(&f).unwrap().get_pixel(0, 0).0, [0x12, 0x12, 0x12]);
    }

    #[test]
    fn bgr_is_swapped() {
        let f = frame(1, 1, PixelFormat::Bgr8, BayerTile::None, vec![1, 2, 3]);
        assert_eq!(to_rgb8(&f).unwrap().get_pixel(0, 0).0, [3, 2, 1]);
    }

    #[test]
    fn short_buffer_rejected() {
        let f = frame(4, 4, PixelFormat::Raw8, BayerTile::RGGB, vec![0; 15]);
        assert!(matches!(to_rgb8(&f), Err(Error::InvalidFrame { .. })));
    }
}
