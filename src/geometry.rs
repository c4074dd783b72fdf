//! Marker projection from an image's native pixel space into its
//! responsively scaled rendering.
//!
//! Pure math, available on every target. The session lifecycle that decides
//! *when* to project lives in [`crate::session`].

use serde::Deserialize;

/// A point annotation in the map image's native pixel space.
///
/// Markers arrive on the wire inside `map_data` of a location query
/// response. Shape and color are decorative pass-through values; the
/// service emits an open set (`"circle"`, `"square"`, hex colors).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Marker {
    /// X coordinate in native (unscaled) image pixels.
    pub x: f64,
    /// Y coordinate in native (unscaled) image pixels.
    pub y: f64,
    #[serde(default)]
    pub name: Option<String>,
    /// Marker role as named by the service, e.g. `query_location` or
    /// `nearest_point`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub shape: Option<String>,
    /// Walking distance to the annotated point, in map units.
    #[serde(default)]
    pub distance: Option<f64>,
}

impl Marker {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            name: None,
            kind: None,
            color: None,
            shape: None,
            distance: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Natural and displayed dimensions of the rendered map image.
///
/// Measured fresh on every resize; never cached beyond one projection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RenderSurface {
    pub natural_width: u32,
    pub natural_height: u32,
    pub display_width: u32,
    pub display_height: u32,
}

impl RenderSurface {
    pub fn new(
        natural_width: u32,
        natural_height: u32,
        display_width: u32,
        display_height: u32,
    ) -> Self {
        Self {
            natural_width,
            natural_height,
            display_width,
            display_height,
        }
    }

    /// An image that has not finished loading or laying out reports zero on
    /// one or more axes and cannot be projected onto yet.
    pub fn is_measurable(&self) -> bool {
        self.natural_width > 0
            && self.natural_height > 0
            && self.display_width > 0
            && self.display_height > 0
    }

    /// Per-axis scale factors, displayed over natural.
    ///
    /// Axes are independent: a non-uniformly stretched image scales X and Y
    /// differently. `None` when the surface is not measurable.
    pub fn scale(&self) -> Option<(f64, f64)> {
        if !self.is_measurable() {
            return None;
        }
        Some((
            f64::from(self.display_width) / f64::from(self.natural_width),
            f64::from(self.display_height) / f64::from(self.natural_height),
        ))
    }
}

/// A marker positioned in displayed space.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedMarker {
    /// X position in displayed pixels, rounded to the nearest pixel.
    pub x: i32,
    /// Y position in displayed pixels, rounded to the nearest pixel.
    pub y: i32,
    /// The position falls outside the visible surface. Such markers are
    /// still emitted; the renderer decides what to do with them.
    pub out_of_bounds: bool,
    /// The native-space marker this position was computed from, untouched.
    pub marker: Marker,
}

/// Projects markers onto the displayed surface.
///
/// Returns `None` to defer when the surface is not measurable — the caller
/// re-runs the projection once dimensions are confirmed. Never divides by
/// zero and never produces a NaN position. Out-of-bounds markers are
/// emitted with a warning rather than dropped.
pub fn project(markers: &[Marker], surface: RenderSurface) -> Option<Vec<PositionedMarker>> {
    let Some((scale_x, scale_y)) = surface.scale() else {
        #[cfg(feature = "tracing")]
        tracing::warn!(?surface, "surface dimensions not measurable, deferring projection");
        return None;
    };

    let positioned = markers
        .iter()
        .map(|marker| {
            let x = (marker.x * scale_x).round() as i32;
            let y = (marker.y * scale_y).round() as i32;
            let out_of_bounds = x < 0
                || y < 0
                || x > surface.display_width as i32
                || y > surface.display_height as i32;

            #[cfg(feature = "tracing")]
            if out_of_bounds {
                tracing::warn!(
                    name = marker.name.as_deref().unwrap_or("<unnamed>"),
                    x,
                    y,
                    display_width = surface.display_width,
                    display_height = surface.display_height,
                    "marker position falls outside the displayed image"
                );
            }

            PositionedMarker {
                x,
                y,
                out_of_bounds,
                marker: marker.clone(),
            }
        })
        .collect();

    Some(positioned)
}
