//! Fast-marching inpainting
//!
//! Masked pixels are filled in order of their distance to the known region.
//! Each new pixel is a weighted mean of settled pixels within the
//! radius; weights favour close neighbours lying along the marching
//! direction at a similar distance level.

use image::{GrayImage, Rgb, RgbImage};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const KNOWN: u8 = 0;
const BAND: u8 = 1;
const INSIDE: u8 = 2;
const FAR: f32 = 1.0e6;

#[derive(Debug, Clone, Copy)]
struct BandPixel {
    distance: f32,
    index: usize,
}

impl PartialEq for BandPixel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BandPixel {}

impl PartialOrd for BandPixel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BandPixel {
    // Reversed so the max-heap pops the smallest distance first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.index.cmp(&self.index))
    }
}

struct Field {
    width: usize,
    height: usize,
    flags: Vec<u8>,
    distance: Vec<f32>,
    colors: Vec<[f32; 3]>,
}

impl Field {
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    fn flag(&self, x: i64, y: i64) -> Option<u8> {
        self.index(x, y).and_then(|i| self.flags.get(i).copied())
    }

    fn is_settled(&self, x: i64, y: i64) -> bool {
        matches!(self.flag(x, y), Some(f) if f != INSIDE)
    }

    fn dist(&self, x: i64, y: i64) -> f32 {
        self.index(x, y)
            .and_then(|i| self.distance.get(i).copied())
            .unwrap_or(FAR)
    }

    /// Upwind solution of |grad T| = 1 from two orthogonal neighbours
    fn solve(&self, (x1, y1): (i64, i64), (x2, y2): (i64, i64)) -> f32 {
        let known1 = self.is_settled(x1, y1);
        let known2 = self.is_settled(x2, y2);
        let t1 = self.dist(x1, y1);
        let t2 = self.dist(x2, y2);

        match (known1, known2) {
            (true, true) => {
                let diff = t1 - t2;
                let r_squared = 2.0 - diff * diff;
                if r_squared < 0.0 {
                    return 1.0 + t1.min(t2);
                }
                let r = r_squared.sqrt();
                let s = (t1 + t2 - r) / 2.0;
                if s >= t1 && s >= t2 {
                    s
                } else {
                    let s = s + r;
                    if s >= t1 && s >= t2 {
                        s
                    } else {
                        1.0 + t1.min(t2)
                    }
                }
            },
            (true, false) => 1.0 + t1,
            (false, true) => 1.0 + t2,
            (false, false) => FAR,
        }
    }

    fn arrival_time(&self, x: i64, y: i64) -> f32 {
        [
            self.solve((x - 1, y), (x, y - 1)),
            self.solve((x + 1, y), (x, y - 1)),
            self.solve((x - 1, y), (x, y + 1)),
            self.solve((x + 1, y), (x, y + 1)),
        ]
        .into_iter()
        .fold(FAR, f32::min)
    }

    fn gradient(&self, x: i64, y: i64) -> (f32, f32) {
        let centre = self.dist(x, y);
        let axis = |(ax, ay): (i64, i64), (bx, by): (i64, i64)| -> f32 {
            match (self.is_settled(ax, ay), self.is_settled(bx, by)) {
                (true, true) => (self.dist(bx, by) - self.dist(ax, ay)) / 2.0,
                (false, true) => self.dist(bx, by) - centre,
                (true, false) => centre - self.dist(ax, ay),
                (false, false) => 0.0,
            }
        };
        (axis((x - 1, y), (x + 1, y)), axis((x, y - 1), (x, y + 1)))
    }

    fn fill(&mut self, x: i64, y: i64, radius: i64) {
        let Some(target) = self.index(x, y) else {
            return;
        };
        let target_distance = self.dist(x, y);
        let (gx, gy) = self.gradient(x, y);
        let radius_squared = radius * radius;

        let mut sum = [0.0f32; 3];
        let mut total_weight = 0.0f32;

        for ny in (y - radius)..=(y + radius) {
            for nx in (x - radius)..=(x + radius) {
                let (rx, ry) = (x - nx, y - ny);
                let length_squared = rx * rx + ry * ry;
                if length_squared == 0 || length_squared > radius_squared {
                    continue;
                }
                if !self.is_settled(nx, ny) {
                    continue;
                }
                let Some(source) = self.index(nx, ny) else {
                    continue;
                };

                let length = (length_squared as f32).sqrt();
                let direction = ((rx as f32 * gx + ry as f32 * gy) / length).abs().max(1.0e-6);
                let proximity = 1.0 / (length_squared as f32 * length);
                let level = 1.0 / (1.0 + (self.dist(nx, ny) - target_distance).abs());
                let weight = direction * proximity * level;

                if let Some(color) = self.colors.get(source) {
                    for (acc, channel) in sum.iter_mut().zip(color) {
                        *acc += weight * channel;
                    }
                    total_weight += weight;
                }
            }
        }

        if total_weight > 0.0 {
            if let Some(color) = self.colors.get_mut(target) {
                for (channel, acc) in color.iter_mut().zip(sum) {
                    *channel = acc / total_weight;
                }
            }
        }
    }
}

/// Fill the nonzero pixels of `mask` from their surroundings
///
/// Pixels outside the mask are returned unchanged. A mask with different
/// dimensions than the image is read where it overlaps.
#[must_use]
pub fn inpaint_telea(image: &RgbImage, mask: &GrayImage, radius: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let radius = i64::from(radius.max(1));

    let mut field = Field {
        width: w,
        height: h,
        flags: vec![KNOWN; w * h],
        distance: vec![0.0; w * h],
        colors: image
            .pixels()
            .map(|p| [f32::from(p[0]), f32::from(p[1]), f32::from(p[2])])
            .collect(),
    };

    let selected = mask_indices(mask, width, height);
    let mut inside_count = 0usize;
    for ((flag, dist), masked) in field
        .flags
        .iter_mut()
        .zip(field.distance.iter_mut())
        .zip(&selected)
    {
        if *masked {
            *flag = INSIDE;
            *dist = FAR;
            inside_count += 1;
        }
    }

    if inside_count == 0 || inside_count == w * h {
        return image.clone();
    }

    let mut heap = BinaryHeap::new();
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            if field.flag(x, y) != Some(KNOWN) {
                continue;
            }
            let touches_hole = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
                .into_iter()
                .any(|(nx, ny)| field.flag(nx, ny) == Some(INSIDE));
            if touches_hole {
                if let Some(index) = field.index(x, y) {
                    if let Some(flag) = field.flags.get_mut(index) {
                        *flag = BAND;
                    }
                    heap.push(BandPixel {
                        distance: 0.0,
                        index,
                    });
                }
            }
        }
    }

    while let Some(BandPixel { index, .. }) = heap.pop() {
        if field.flags.get(index) == Some(&KNOWN) {
            continue;
        }
        if let Some(flag) = field.flags.get_mut(index) {
            *flag = KNOWN;
        }
        let (x, y) = ((index % w) as i64, (index / w) as i64);

        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            let Some(neighbour) = field.index(nx, ny) else {
                continue;
            };
            if field.flags.get(neighbour) != Some(&INSIDE) {
                continue;
            }
            let arrival = field.arrival_time(nx, ny);
            if let Some(dist) = field.distance.get_mut(neighbour) {
                *dist = arrival;
            }
            field.fill(nx, ny, radius);
            if let Some(flag) = field.flags.get_mut(neighbour) {
                *flag = BAND;
            }
            heap.push(BandPixel {
                distance: arrival,
                index: neighbour,
            });
        }
    }

    let mut output = image.clone();
    for (index, (masked, color)) in selected.iter().zip(&field.colors).enumerate() {
        if *masked {
            let (x, y) = ((index % w) as u32, (index / w) as u32);
            output.put_pixel(x, y, to_rgb(*color));
        }
    }
    output
}

pub(crate) fn mask_indices(mask: &GrayImage, width: u32, height: u32) -> Vec<bool> {
    let mut selected = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            selected.push(mask.get_pixel_checked(x, y).is_some_and(|m| m[0] > 0));
        }
    }
    selected
}

pub(crate) fn to_rgb(color: [f32; 3]) -> Rgb<u8> {
    Rgb(color.map(|c| c.round().clamp(0.0, 255.0) as u8))
}
