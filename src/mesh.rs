//! Mesh-loading collaborator boundary.
//!
//! The placement core never touches a triangle mesh or an STL parser
//! directly; it only calls through the `MeshSource` trait described in the
//! external interfaces section of the design. `synthetic` is a minimal,
//! deliberately non-general implementation: it treats every "model" as an
//! axis-aligned rectangular footprint of a fixed size in microns. That's
//! enough to exercise `Part`, `Plate`, `Placer` and `SearchEngine` end to
//! end without pulling a real mesh-format decoder into this crate.

use crate::bitmap::Bitmap;

/// A 3D point, used only for the bounding-box contract below.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Collaborator contract for loading and rasterising a 3D model.
///
/// A real implementation would parse a triangle mesh file and project it
/// onto the plate plane; see §1/§6 of the design for why that parser is
/// explicitly kept out of this crate.
pub trait MeshSource {
    /// Reorients the model so `orientation` (e.g. `"bottom"`) lies flat on
    /// the plate plane. Returns a new, reoriented model.
    fn put_face_on_plate(&self, orientation: &str) -> Self;

    /// Rasterises the model's footprint at `precision` microns per pixel,
    /// padded so the outermost occupied pixel is `ceil(spacing/precision)`
    /// cells from every edge.
    fn pixelize(&self, precision: f64, spacing: f64) -> Bitmap;

    fn min(&self) -> Point3;
    fn max(&self) -> Point3;
}

/// A synthetic "model": an axis-aligned rectangular footprint of a given
/// size in microns, flush with the plate plane. Orientation tags are
/// accepted but have no effect since the footprint is already a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectModel {
    pub width_microns: f64,
    pub height_microns: f64,
}

impl RectModel {
    pub fn new(width_microns: f64, height_microns: f64) -> Self {
        RectModel { width_microns, height_microns }
    }
}

impl MeshSource for RectModel {
    fn put_face_on_plate(&self, _orientation: &str) -> Self {
        *self
    }

    fn pixelize(&self, precision: f64, spacing: f64) -> Bitmap {
        // The spacing margin is baked directly into the occupied silhouette
        // (grown/dilated footprint), not left as empty canvas around it, so
        // that `Part::load`'s rotate+trim fan keeps the margin on every
        // rotation instead of trimming it away.
        let pad = (spacing / precision).ceil() as usize;
        let w = (self.width_microns / precision).ceil() as usize + 2 * pad;
        let h = (self.height_microns / precision).ceil() as usize + 2 * pad;
        Bitmap::filled(w.max(1), h.max(1))
    }

    fn min(&self) -> Point3 {
        Point3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    fn max(&self) -> Point3 {
        Point3 { x: self.width_microns, y: self.height_microns, z: 0.0 }
    }
}

/// Loads a model by filename. The synthetic source has no files on disk; it
/// parses the filename as `"<width>x<height>.synth"` (microns), which is
/// all the test suite and CLI demo data need.
pub fn load(filename: &str) -> Result<RectModel, crate::error::PlaterError> {
    let stem = filename.strip_suffix(".synth").unwrap_or(filename);
    let (w, h) = stem.split_once('x').ok_or_else(|| {
        crate::error::PlaterError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cannot parse synthetic model name '{filename}', expected '<w>x<h>.synth'"),
        ))
    })?;
    let width_microns: f64 = w.parse().map_err(|_| {
        crate::error::PlaterError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid width in '{filename}'"),
        ))
    })?;
    let height_microns: f64 = h.parse().map_err(|_| {
        crate::error::PlaterError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid height in '{filename}'"),
        ))
    })?;
    Ok(RectModel::new(width_microns, height_microns))
}
