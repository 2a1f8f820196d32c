//! Outputs (displays) and the absolute-coordinate transform.
//!
//! Absolute pointer and touch coordinates arrive from the input library
//! already scaled to the bound output's current mode (the library asks for
//! the mode size through the "screen dimensions" query).  Before they are
//! forwarded they must be mapped into the compositor's global space, which
//! means undoing the output's rotation/flip, dividing by its scale, and
//! adding its position.
//!
//! Devices never hold a reference to an [`Output`].  They store an
//! [`OutputId`] and look it up in the [`OutputLayout`] on every event, so a
//! display that has been unplugged simply stops resolving.

use std::fmt;

/// Stable identifier of an output for the lifetime of its attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u32);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// Rotation / reflection applied to an output's framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTransform {
    #[default]
    Normal,
    Rotated90,
    Rotated180,
    Rotated270,
    Flipped,
    Flipped90,
    Flipped180,
    Flipped270,
}

/// Position, mode, scale and transform of an output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGeometry {
    /// X of the top-left corner in global compositor space.
    pub x: i32,
    /// Y of the top-left corner in global compositor space.
    pub y: i32,
    /// Current mode width in device pixels.
    pub mode_width: u32,
    /// Current mode height in device pixels.
    pub mode_height: u32,
    /// Integer output scale (1 on standard-density displays).
    pub scale: u32,
    pub transform: OutputTransform,
}

impl OutputGeometry {
    /// An untransformed, scale-1 output of the given mode at (`x`, `y`).
    pub fn new(x: i32, y: i32, mode_width: u32, mode_height: u32) -> Self {
        Self {
            x,
            y,
            mode_width,
            mode_height,
            scale: 1,
            transform: OutputTransform::Normal,
        }
    }

    /// Maps a device coordinate in mode pixels into global compositor space.
    ///
    /// Pure function of the coordinate and the geometry.  Must be applied to
    /// every absolute motion and touch coordinate, never to relative motion.
    pub fn transform_point(&self, device_x: f64, device_y: f64) -> (f64, f64) {
        let width = f64::from(self.mode_width);
        let height = f64::from(self.mode_height);

        let (tx, ty) = match self.transform {
            OutputTransform::Normal => (device_x, device_y),
            OutputTransform::Rotated90 => (device_y, width - device_x),
            OutputTransform::Rotated180 => (width - device_x, height - device_y),
            OutputTransform::Rotated270 => (height - device_y, device_x),
            OutputTransform::Flipped => (width - device_x, device_y),
            OutputTransform::Flipped90 => (height - device_y, width - device_x),
            OutputTransform::Flipped180 => (device_x, height - device_y),
            OutputTransform::Flipped270 => (device_y, device_x),
        };

        let scale = f64::from(self.scale.max(1));
        (
            tx / scale + f64::from(self.x),
            ty / scale + f64::from(self.y),
        )
    }
}

/// A display known to the compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub id: OutputId,
    /// Connector name, e.g. `"HDMI-A-1"`; matched against device hints.
    pub name: String,
    pub geometry: OutputGeometry,
}

/// Ordered set of live outputs.
///
/// Order is creation order; the first entry is the "first available" output
/// used as the default binding for new devices.
#[derive(Debug, Clone, Default)]
pub struct OutputLayout {
    outputs: Vec<Output>,
}

impl OutputLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an output, replacing any existing entry with the same id.
    pub fn insert(&mut self, output: Output) {
        match self.outputs.iter_mut().find(|o| o.id == output.id) {
            Some(existing) => *existing = output,
            None => self.outputs.push(output),
        }
    }

    /// Removes and returns the output with `id`.
    pub fn remove(&mut self, id: OutputId) -> Option<Output> {
        let pos = self.outputs.iter().position(|o| o.id == id)?;
        Some(self.outputs.remove(pos))
    }

    pub fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    /// Updates the geometry of a live output (mode change, move, rotate).
    ///
    /// Returns `false` if no output with `id` exists.
    pub fn update_geometry(&mut self, id: OutputId, geometry: OutputGeometry) -> bool {
        match self.outputs.iter_mut().find(|o| o.id == id) {
            Some(output) => {
                output.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub fn first(&self) -> Option<&Output> {
        self.outputs.first()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(transform: OutputTransform) -> OutputGeometry {
        OutputGeometry {
            transform,
            ..OutputGeometry::new(0, 0, 1920, 1080)
        }
    }

    #[test]
    fn test_normal_transform_adds_output_offset() {
        let geo = OutputGeometry::new(1920, 100, 1280, 720);
        assert_eq!(geo.transform_point(10.0, 20.0), (1930.0, 120.0));
    }

    #[test]
    fn test_rotated_transforms_follow_mode_dimensions() {
        assert_eq!(
            geometry(OutputTransform::Rotated90).transform_point(100.0, 50.0),
            (50.0, 1820.0)
        );
        assert_eq!(
            geometry(OutputTransform::Rotated180).transform_point(100.0, 50.0),
            (1820.0, 1030.0)
        );
        assert_eq!(
            geometry(OutputTransform::Rotated270).transform_point(100.0, 50.0),
            (1030.0, 100.0)
        );
    }

    #[test]
    fn test_flipped_transforms() {
        assert_eq!(
            geometry(OutputTransform::Flipped).transform_point(100.0, 50.0),
            (1820.0, 50.0)
        );
        assert_eq!(
            geometry(OutputTransform::Flipped90).transform_point(100.0, 50.0),
            (1030.0, 1820.0)
        );
        assert_eq!(
            geometry(OutputTransform::Flipped180).transform_point(100.0, 50.0),
            (100.0, 1030.0)
        );
        assert_eq!(
            geometry(OutputTransform::Flipped270).transform_point(100.0, 50.0),
            (50.0, 100.0)
        );
    }

    #[test]
    fn test_scale_divides_before_offset() {
        let geo = OutputGeometry {
            scale: 2,
            ..OutputGeometry::new(10, 20, 3840, 2160)
        };
        assert_eq!(geo.transform_point(200.0, 100.0), (110.0, 70.0));
    }

    #[test]
    fn test_layout_first_is_creation_order() {
        // Arrange
        let mut layout = OutputLayout::new();
        layout.insert(Output {
            id: OutputId(7),
            name: "DP-1".into(),
            geometry: OutputGeometry::new(0, 0, 1920, 1080),
        });
        layout.insert(Output {
            id: OutputId(3),
            name: "HDMI-A-1".into(),
            geometry: OutputGeometry::new(1920, 0, 1920, 1080),
        });

        // Act
        let removed = layout.remove(OutputId(7));

        // Assert
        assert!(removed.is_some());
        assert_eq!(layout.first().map(|o| o.id), Some(OutputId(3)));
        assert!(layout.find_by_name("DP-1").is_none());
    }

    #[test]
    fn test_update_geometry_of_unknown_output_returns_false() {
        let mut layout = OutputLayout::new();
        assert!(!layout.update_geometry(OutputId(1), OutputGeometry::new(0, 0, 1, 1)));
    }
}
