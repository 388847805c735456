//! Conversions between 1/96" units and device pixels.

use crate::rect::{size, Margins, Size};

/// Screen resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dpi(pub u32);

impl Dpi {
    /// The resolution at which 1/96" units and pixels coincide.
    pub const STANDARD: Dpi = Dpi(96);

    fn scale_from_96(self) -> f64 {
        f64::from(self.0) / 96.
    }

    /// Converts from 1/96" units to device pixels.
    pub fn int_from_96(self, value: i32) -> i32 {
        scale_int(value, self.scale_from_96())
    }

    pub fn size_from_96(self, value: Size) -> Size {
        let scale = self.scale_from_96();
        size(scale_int(value.x, scale), scale_int(value.y, scale))
    }

    pub fn margins_from_96(self, value: Margins) -> Margins {
        scale_margins(value, self.scale_from_96())
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Dpi::STANDARD
    }
}

fn scale_int(value: i32, scale: f64) -> i32 {
    (f64::from(value) * scale).round() as i32
}

fn scale_margins(value: Margins, scale: f64) -> Margins {
    Margins {
        h_near: scale_int(value.h_near, scale),
        v_near: scale_int(value.v_near, scale),
        h_far: scale_int(value.h_far, scale),
        v_far: scale_int(value.v_far, scale),
    }
}

#[test]
fn test_dpi_scaling() {
    let dpi = Dpi(144);
    assert_eq!(dpi.int_from_96(9), 14); // 13.5 rounds away from zero
    assert_eq!(dpi.size_from_96(size(100, 50)), size(150, 75));
    assert_eq!(Dpi::STANDARD.margins_from_96(Margins::uniform(9)), Margins::uniform(9));
    assert_eq!(Dpi(192).margins_from_96(Margins::new(1, 2, 3, 4)), Margins::new(2, 4, 6, 8));
}
