//! Diffusion inpainting
//!
//! The hole is first seeded layer by layer from the outside in, each pixel
//! taking the distance-weighted mean of filled pixels within the radius.
//! Jacobi relaxation of the Laplace equation then smooths the fill so
//! colour diffuses evenly from the boundary. Known pixels act as fixed
//! boundary values throughout.

use super::telea::{mask_indices, to_rgb};
use image::{GrayImage, RgbImage};

const NEIGHBOURS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

struct Grid {
    width: i64,
    height: i64,
}

impl Grid {
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    fn coords(&self, index: usize) -> (i64, i64) {
        let index = index as i64;
        (index % self.width, index / self.width)
    }
}

/// Fill the nonzero pixels of `mask` by diffusion from their surroundings
///
/// Pixels outside the mask are returned unchanged.
#[must_use]
pub fn inpaint_diffusion(
    image: &RgbImage,
    mask: &GrayImage,
    radius: u32,
    iterations: u32,
) -> RgbImage {
    let (width, height) = image.dimensions();
    let grid = Grid {
        width: i64::from(width),
        height: i64::from(height),
    };
    let radius = i64::from(radius.max(1));

    let selected = mask_indices(mask, width, height);
    let hole: Vec<usize> = selected
        .iter()
        .enumerate()
        .filter_map(|(i, masked)| masked.then_some(i))
        .collect();
    if hole.is_empty() || hole.len() == selected.len() {
        return image.clone();
    }

    let mut colors: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [f32::from(p[0]), f32::from(p[1]), f32::from(p[2])])
        .collect();
    let mut filled: Vec<bool> = selected.iter().map(|masked| !masked).collect();

    // Onion-peel seeding
    let mut pending = hole.clone();
    while !pending.is_empty() {
        let layer: Vec<usize> = pending
            .iter()
            .copied()
            .filter(|&index| {
                let (x, y) = grid.coords(index);
                NEIGHBOURS_8.iter().any(|(dx, dy)| {
                    grid.index(x + dx, y + dy)
                        .and_then(|n| filled.get(n).copied())
                        .unwrap_or(false)
                })
            })
            .collect();
        if layer.is_empty() {
            break;
        }

        let seeds: Vec<(usize, [f32; 3])> = layer
            .iter()
            .filter_map(|&index| {
                weighted_mean(&grid, &colors, &filled, index, radius).map(|c| (index, c))
            })
            .collect();
        for (index, color) in seeds {
            if let Some(slot) = colors.get_mut(index) {
                *slot = color;
            }
            if let Some(flag) = filled.get_mut(index) {
                *flag = true;
            }
        }
        pending.retain(|&index| !filled.get(index).copied().unwrap_or(true));
    }

    // Jacobi relaxation over the hole only
    let mut next = colors.clone();
    for _ in 0..iterations {
        for &index in &hole {
            let (x, y) = grid.coords(index);
            let mut sum = [0.0f32; 3];
            let mut count = 0.0f32;
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if let Some(color) = grid.index(x + dx, y + dy).and_then(|n| colors.get(n)) {
                    for (acc, channel) in sum.iter_mut().zip(color) {
                        *acc += channel;
                    }
                    count += 1.0;
                }
            }
            if count > 0.0 {
                if let Some(slot) = next.get_mut(index) {
                    *slot = sum.map(|c| c / count);
                }
            }
        }
        std::mem::swap(&mut colors, &mut next);
        next.clone_from(&colors);
    }

    let mut output = image.clone();
    for &index in &hole {
        if let Some(color) = colors.get(index) {
            let (x, y) = grid.coords(index);
            output.put_pixel(x as u32, y as u32, to_rgb(*color));
        }
    }
    output
}

fn weighted_mean(
    grid: &Grid,
    colors: &[[f32; 3]],
    filled: &[bool],
    index: usize,
    radius: i64,
) -> Option<[f32; 3]> {
    let (x, y) = grid.coords(index);
    let radius_squared = radius * radius;
    let mut sum = [0.0f32; 3];
    let mut total = 0.0f32;

    for ny in (y - radius)..=(y + radius) {
        for nx in (x - radius)..=(x + radius) {
            let d2 = (nx - x).pow(2) + (ny - y).pow(2);
            if d2 == 0 || d2 > radius_squared {
                continue;
            }
            let Some(n) = grid.index(nx, ny) else {
                continue;
            };
            if !filled.get(n).copied().unwrap_or(false) {
                continue;
            }
            if let Some(color) = colors.get(n) {
                let weight = 1.0 / d2 as f32;
                for (acc, channel) in sum.iter_mut().zip(color) {
                    *acc += weight * channel;
                }
                total += weight;
            }
        }
    }

    (total > 0.0).then(|| sum.map(|c| c / total))
}
