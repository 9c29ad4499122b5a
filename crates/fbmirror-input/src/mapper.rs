//! Host window coordinates → guest device coordinates.

use fbmirror_types::{Axis, AxisRange, AxisRanges, DisplayGeometry};

/// Scale one coordinate into the device range.
///
/// With a declared range the result is
/// `minimum + host_value * (maximum - minimum) / host_extent`, integer
/// arithmetic with truncating division. A zero `maximum` passes the value
/// through unchanged. A zero `host_extent` maps everything to `minimum`.
#[allow(clippy::cast_possible_truncation)]
pub fn map_axis(host_value: i32, host_extent: u32, range: AxisRange) -> i32 {
    if range.is_passthrough() {
        return host_value;
    }
    if host_extent == 0 {
        return range.minimum;
    }
    let span = i64::from(range.maximum) - i64::from(range.minimum);
    let scaled = i64::from(range.minimum) + i64::from(host_value) * span / i64::from(host_extent);
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Maps pointer positions in the displayed window into device space.
///
/// The host extent of each axis is the visible framebuffer resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    ranges: AxisRanges,
    width: u32,
    height: u32,
}

impl CoordinateMapper {
    pub fn new(ranges: AxisRanges, geometry: &DisplayGeometry) -> Self {
        Self {
            ranges,
            width: geometry.width,
            height: geometry.height,
        }
    }

    pub fn ranges(&self) -> AxisRanges {
        self.ranges
    }

    pub fn map_axis(&self, axis: Axis, host_value: i32) -> i32 {
        let extent = match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        };
        map_axis(host_value, extent, self.ranges.get(axis))
    }

    /// Map a host point to device coordinates.
    pub fn map(&self, x: i32, y: i32) -> (i32, i32) {
        (self.map_axis(Axis::X, x), self.map_axis(Axis::Y, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_with_truncation() {
        // 320 * 1023 / 640 = 511.5
        assert_eq!(map_axis(320, 640, AxisRange::new(0, 1023)), 511);
        assert_eq!(map_axis(0, 640, AxisRange::new(0, 1023)), 0);
        assert_eq!(map_axis(640, 640, AxisRange::new(0, 1023)), 1023);
    }

    #[test]
    fn honours_minimum_offset() {
        // 100 + 240 * (4000 - 100) / 480 = 2050
        assert_eq!(map_axis(240, 480, AxisRange::new(100, 4000)), 2050);
    }

    #[test]
    fn emulator_mode_passes_through() {
        let range = AxisRange::new(0, 0);
        for v in [-50, 0, 1, 319, 640, 100_000] {
            assert_eq!(map_axis(v, 640, range), v);
        }
    }

    #[test]
    fn zero_extent_maps_to_minimum() {
        assert_eq!(map_axis(10, 0, AxisRange::new(7, 100)), 7);
    }

    #[test]
    fn large_values_do_not_overflow() {
        let range = AxisRange::new(0, i32::MAX);
        assert_eq!(map_axis(1, 1, range), i32::MAX);
        assert_eq!(map_axis(2, 1, range), i32::MAX);
    }

    #[test]
    fn mapper_uses_visible_resolution_per_axis() {
        let geometry = DisplayGeometry {
            virtual_height: 960,
            ..DisplayGeometry::packed(640, 480, 2)
        };
        let ranges = AxisRanges::new(AxisRange::new(0, 1023), AxisRange::new(0, 767));
        let mapper = CoordinateMapper::new(ranges, &geometry);
        // 240 * 767 / 480 = 383.5
        assert_eq!(mapper.map(320, 240), (511, 383));
    }

    #[test]
    fn mapper_mixed_passthrough() {
        let geometry = DisplayGeometry::packed(640, 480, 2);
        let ranges = AxisRanges::new(AxisRange::new(0, 1279), AxisRange::default());
        let mapper = CoordinateMapper::new(ranges, &geometry);
        assert_eq!(mapper.map(320, 123), (639, 123));
    }
}
