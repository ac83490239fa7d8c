//! A loaded, pre-rasterised part: one model plus a fan of rotated bitmaps.

use std::f64::consts::PI;

use crate::bitmap::Bitmap;
use crate::error::PlaterError;
use crate::mesh::MeshSource;
use crate::plate_mode::PlateMode;

/// A part ready for placement: its filename (the request's unique key), its
/// footprint size in microns, and a fan of `rotations()` bitmaps indexed by
/// rotation step. An absent entry means that orientation doesn't fit the
/// plate at all.
#[derive(Debug)]
pub struct Part {
    filename: String,
    width: f64,
    height: f64,
    delta_theta: f64,
    bmp: Vec<Option<Bitmap>>,
    surface: f64,
    density: f64,
}

impl Part {
    /// Loads, reorients, rasterises and pre-rotates a model.
    ///
    /// Returns `Err(PartInfeasible)` if no rotation fits the plate.
    pub fn load<M: MeshSource>(
        filename: &str,
        model: &M,
        precision: f64,
        delta_theta: f64,
        spacing: f64,
        orientation: &str,
        plate_mode: PlateMode,
    ) -> Result<Part, PlaterError> {
        let reoriented = model.put_face_on_plate(orientation);
        let bmp0 = reoriented.pixelize(precision, spacing);
        let surface = (bmp0.width() * bmp0.height()) as f64;
        // Cached now, before the feasibility loop below can null out
        // `bmp[0]` (a part that only fits rotated still has a density).
        let density = bmp0.density();

        let min = reoriented.min();
        let max = reoriented.max();
        let width = (max.x - min.x) + 2.0 * spacing;
        let height = (max.y - min.y) + 2.0 * spacing;

        let rotations = ((2.0 * PI) / delta_theta).ceil() as usize;
        let mut bmp: Vec<Option<Bitmap>> = Vec::with_capacity(rotations);
        bmp.push(Some(bmp0));
        for k in 1..rotations {
            let rotated = bmp[0].as_ref().unwrap().rotate(k as f64 * delta_theta);
            bmp.push(Some(rotated.trim()));
        }

        let mut feasible = 0usize;
        for slot in bmp.iter_mut() {
            let Some(candidate) = slot.as_ref() else { continue };
            let w_microns = candidate.width() as f64 * precision;
            let h_microns = candidate.height() as f64 * precision;
            if plate_mode.bitmap_fits(w_microns, h_microns) {
                feasible += 1;
            } else {
                *slot = None;
            }
        }

        if feasible == 0 {
            return Err(PlaterError::PartInfeasible {
                filename: filename.to_string(),
                reason: "no rotation fits the plate (bed too small? try more angles?)".to_string(),
            });
        }

        Ok(Part {
            filename: filename.to_string(),
            width,
            height,
            delta_theta,
            bmp,
            surface,
            density,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn delta_theta(&self) -> f64 {
        self.delta_theta
    }

    pub fn surface(&self) -> f64 {
        self.surface
    }

    /// Density of the unrotated bitmap, used as a sort key. Cached at
    /// construction time since `bmp[0]` itself may be dropped by the
    /// feasibility loop in `load` (a part that only fits rotated).
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn rotations(&self) -> usize {
        self.bmp.len()
    }

    pub fn bmp(&self, k: usize) -> Option<&Bitmap> {
        self.bmp[k].as_ref()
    }
}
