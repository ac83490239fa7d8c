//! A single build plate: a growing raster plus the parts placed on it.

use std::sync::Arc;

use crate::bitmap::Bitmap;
use crate::part::Part;
use crate::plate_mode::PlateMode;

/// A part placed on a plate: which `Part`, which rotation index, and its
/// centre in micron space. Lifetime is tied to the containing `Plate`.
#[derive(Clone)]
pub struct PartInstance {
    part: Arc<Part>,
    rotation: usize,
    center_x_microns: f64,
    center_y_microns: f64,
}

impl PartInstance {
    pub fn part(&self) -> &Arc<Part> {
        &self.part
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// The placement angle in radians, `rotation * delta_theta`.
    pub fn angle(&self) -> f64 {
        self.rotation as f64 * self.part.delta_theta()
    }

    pub fn center_microns(&self) -> (f64, f64) {
        (self.center_x_microns, self.center_y_microns)
    }
}

/// One build plate: an accumulated occupancy raster and the ordered list of
/// parts stamped onto it. Plates are append-only once sealed by the Placer.
pub struct Plate {
    bitmap: Bitmap,
    precision: f64,
    plate_mode: PlateMode,
    instances: Vec<PartInstance>,
}

impl Plate {
    pub fn new(plate_mode: PlateMode, precision: f64) -> Self {
        let (w_microns, h_microns) = plate_mode.bounding_box();
        let w = (w_microns / precision).ceil() as usize;
        let h = (h_microns / precision).ceil() as usize;
        Plate {
            bitmap: Bitmap::empty(w.max(1), h.max(1)),
            precision,
            plate_mode,
            instances: Vec::new(),
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn instances(&self) -> &[PartInstance] {
        &self.instances
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Whether `part_bmp` stamped at pixel offset `(ox, oy)` lies fully
    /// within the plate's bounds and, for a circular plate, fully within
    /// the inscribed disk.
    pub fn shape_contains(&self, part_bmp: &Bitmap, ox: i64, oy: i64) -> bool {
        let w = self.bitmap.width() as i64;
        let h = self.bitmap.height() as i64;
        if ox < 0 || oy < 0 || ox + part_bmp.width() as i64 > w || oy + part_bmp.height() as i64 > h {
            return false;
        }

        match self.plate_mode {
            PlateMode::Rectangle { .. } => true,
            PlateMode::Circle { .. } => {
                let radius = w as f64 / 2.0;
                let (cx, cy) = (radius, radius);
                for y in 0..part_bmp.height() as i64 {
                    for x in 0..part_bmp.width() as i64 {
                        if !part_bmp.get(x, y) {
                            continue;
                        }
                        let abs_x = (ox + x) as f64 + 0.5;
                        let abs_y = (oy + y) as f64 + 0.5;
                        let dx = abs_x - cx;
                        let dy = abs_y - cy;
                        if dx * dx + dy * dy > radius * radius {
                            return false;
                        }
                    }
                }
                true
            }
        }
    }

    /// Does `part_bmp` at offset `(ox, oy)` collide with anything already
    /// stamped on this plate?
    pub fn overlaps(&self, part_bmp: &Bitmap, ox: i64, oy: i64) -> bool {
        self.bitmap.overlaps(part_bmp, ox, oy)
    }

    /// Stamps `part`'s rotation `k` at pixel offset `(ox, oy)`, recording a
    /// `PartInstance` whose centre is the offset (converted to microns)
    /// plus the rotated bitmap's own centre offset.
    pub fn place(&mut self, part: Arc<Part>, k: usize, ox: i64, oy: i64) {
        let bmp = part.bmp(k).expect("caller must only place feasible rotations");
        let (bcx, bcy) = bmp.center();
        let center_x_microns = (ox as f64 + bcx) * self.precision;
        let center_y_microns = (oy as f64 + bcy) * self.precision;
        self.bitmap.stamp(bmp, ox, oy);
        self.instances.push(PartInstance {
            part,
            rotation: k,
            center_x_microns,
            center_y_microns,
        });
    }

    /// Tight pixel-space bounding-box diagonal of everything stamped on
    /// this plate so far. Used by `SearchEngine::score`.
    pub fn bbox_diagonal(&self) -> f64 {
        let (mut min_x, mut max_x, mut min_y, mut max_y) =
            (usize::MAX, 0usize, usize::MAX, 0usize);
        let mut any = false;
        for y in 0..self.bitmap.height() {
            for x in 0..self.bitmap.width() {
                if self.bitmap.get(x as i64, y as i64) {
                    any = true;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }
        if !any {
            return 0.0;
        }
        let dw = (max_x - min_x + 1) as f64;
        let dh = (max_y - min_y + 1) as f64;
        (dw * dw + dh * dh).sqrt()
    }
}
