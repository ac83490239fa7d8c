//! Plate shape and size, shared by `Part` (feasibility checks), `Plate`
//! (bounds checks during placement) and `Request` (user input).

/// The shape and size of a build plate, already converted to microns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlateMode {
    Rectangle { width: f64, height: f64 },
    Circle { diameter: f64 },
}

impl PlateMode {
    /// The bounding rectangle a plate's raster must be sized to, in microns.
    pub fn bounding_box(&self) -> (f64, f64) {
        match *self {
            PlateMode::Rectangle { width, height } => (width, height),
            PlateMode::Circle { diameter } => (diameter, diameter),
        }
    }

    /// Whether a `w x h` micron footprint fits the plate shape at all,
    /// i.e. whether some rotation could conceivably be placed on it.
    pub fn bitmap_fits(&self, w_microns: f64, h_microns: f64) -> bool {
        match *self {
            PlateMode::Rectangle { width, height } => w_microns < width && h_microns < height,
            PlateMode::Circle { diameter } => {
                (w_microns * w_microns + h_microns * h_microns).sqrt() <= diameter
            }
        }
    }
}
