// 🗺️ Map boundary - marker collection, balloon sync and the terminal viewport
//
// The controller never talks to a widget directly. It drives anything that
// implements `MapHandle`, and balloon state is recomputed from the selection
// on every frame instead of being toggled by individual click handlers.

use crate::record::{LatLng, RecordId};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Taganrog city center
pub const DEFAULT_CENTER: LatLng = LatLng::new(47.20669, 38.929113);
pub const DEFAULT_ZOOM: f64 = 15.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Zoom and animation used when a selection pans the map
pub const SELECT_ZOOM: f64 = 15.0;
pub const PAN_DURATION: Duration = Duration::from_millis(500);

/// Terminal cell width in virtual map pixels (256 px per tile)
const CELL_PIXELS: f64 = 8.0;

// ============================================================================
// MARKERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Record(RecordId),
    /// The user's own position; never carries a balloon
    User,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: LatLng,
    pub hint: String,
    pub color: Option<&'static str>,
    pub balloon_open: bool,
}

impl Marker {
    pub fn record(id: RecordId, position: LatLng, hint: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Record(id),
            position,
            hint: hint.into(),
            color: None,
            balloon_open: false,
        }
    }

    pub fn user(position: LatLng) -> Self {
        Self {
            kind: MarkerKind::User,
            position,
            hint: "You are here".to_string(),
            color: None,
            balloon_open: false,
        }
    }

    pub fn with_color(mut self, color: Option<&'static str>) -> Self {
        self.color = color;
        self
    }

    pub fn record_id(&self) -> Option<RecordId> {
        match self.kind {
            MarkerKind::Record(id) => Some(id),
            MarkerKind::User => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterOptions {
    /// Pan animation length; `None` jumps immediately
    pub duration: Option<Duration>,
    /// Clamp the requested zoom to the supported range
    pub check_zoom_range: bool,
}

impl Default for CenterOptions {
    fn default() -> Self {
        Self {
            duration: None,
            check_zoom_range: true,
        }
    }
}

impl CenterOptions {
    pub fn animated(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            check_zoom_range: true,
        }
    }
}

/// What the selection controller needs from a map widget
pub trait MapHandle {
    fn set_center(&mut self, center: LatLng, zoom: f64, options: CenterOptions);

    fn markers(&self) -> &[Marker];

    fn open_balloon(&mut self, index: usize);

    fn close_balloon(&mut self, index: usize);
}

// ============================================================================
// BALLOON PROJECTION
// ============================================================================

/// Indices of the record markers whose balloon must be open for `selection`.
/// Every record marker sharing the selected coordinates is included.
pub fn open_set(selection: Option<LatLng>, markers: &[Marker]) -> BTreeSet<usize> {
    let Some(target) = selection else {
        return BTreeSet::new();
    };

    markers
        .iter()
        .enumerate()
        .filter(|(_, m)| m.record_id().is_some() && m.position == target)
        .map(|(i, _)| i)
        .collect()
}

/// Idempotent sweep: open exactly the markers in `open_set`, close the rest
pub fn sync_balloons<M: MapHandle + ?Sized>(map: &mut M, selection: Option<LatLng>) {
    let open = open_set(selection, map.markers());
    for index in 0..map.markers().len() {
        if open.contains(&index) {
            map.open_balloon(index);
        } else {
            map.close_balloon(index);
        }
    }
}

// ============================================================================
// TERMINAL MAP
// ============================================================================

/// Geographic extent of the visible map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Bounds {
    pub fn contains(&self, point: LatLng) -> bool {
        point.lng >= self.west
            && point.lng <= self.east
            && point.lat >= self.south
            && point.lat <= self.north
    }
}

/// Terminal cell rectangle the map is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellArea {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: LatLng,
    to: LatLng,
    started: Instant,
    duration: Duration,
}

/// `MapHandle` implementation rendered on a terminal canvas
#[derive(Debug, Clone)]
pub struct TerminalMap {
    center: LatLng,
    zoom: f64,
    transition: Option<Transition>,
    markers: Vec<Marker>,
}

impl Default for TerminalMap {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER, DEFAULT_ZOOM)
    }
}

impl TerminalMap {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            transition: None,
            markers: Vec::new(),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Target center, ignoring any running animation
    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.transition
            .map(|t| now.duration_since(t.started) < t.duration)
            .unwrap_or(false)
    }

    /// Center as drawn at `now`, linearly interpolated during a pan
    pub fn center_at(&self, now: Instant) -> LatLng {
        let Some(t) = self.transition else {
            return self.center;
        };

        let elapsed = now.saturating_duration_since(t.started);
        if t.duration.is_zero() || elapsed >= t.duration {
            return t.to;
        }

        let k = elapsed.as_secs_f64() / t.duration.as_secs_f64();
        LatLng::new(
            t.from.lat + (t.to.lat - t.from.lat) * k,
            t.from.lng + (t.to.lng - t.from.lng) * k,
        )
    }

    pub fn set_center_at(
        &mut self,
        center: LatLng,
        zoom: f64,
        options: CenterOptions,
        now: Instant,
    ) {
        let from = self.center_at(now);

        self.zoom = if options.check_zoom_range {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            zoom
        };
        self.center = center;
        self.transition = options.duration.map(|duration| Transition {
            from,
            to: center,
            started: now,
            duration,
        });
    }

    pub fn zoom_by(&mut self, delta: f64) {
        let now = Instant::now();
        let center = self.center_at(now);
        self.set_center_at(center, self.zoom + delta, CenterOptions::default(), now);
    }

    /// Replace the marker collection; balloons start closed until the next sweep
    pub fn set_markers(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
    }

    /// First marker with an open balloon
    pub fn open_marker(&self) -> Option<&Marker> {
        self.markers.iter().find(|m| m.balloon_open)
    }

    /// Degrees of longitude covered by one terminal cell
    pub fn degrees_per_cell(&self) -> f64 {
        360.0 / 2f64.powf(self.zoom) / 256.0 * CELL_PIXELS
    }

    /// Visible extent for a canvas of `width` x `height` cells.
    /// Cells are about twice as tall as they are wide.
    pub fn bounds(&self, now: Instant, width: u16, height: u16) -> Bounds {
        let center = self.center_at(now);
        let lng_per_cell = self.degrees_per_cell();
        let lat_per_cell = lng_per_cell * 2.0 * center.lat.to_radians().cos().abs();

        let half_w = lng_per_cell * f64::from(width.max(1)) / 2.0;
        let half_h = lat_per_cell * f64::from(height.max(1)) / 2.0;

        Bounds {
            west: center.lng - half_w,
            east: center.lng + half_w,
            south: center.lat - half_h,
            north: center.lat + half_h,
        }
    }

    /// Geographic point under the middle of a terminal cell
    pub fn cell_to_geo(
        &self,
        now: Instant,
        area: CellArea,
        column: u16,
        row: u16,
    ) -> Option<LatLng> {
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }

        let b = self.bounds(now, area.width, area.height);
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);

        Some(LatLng::new(
            b.north - (b.north - b.south) * fy,
            b.west + (b.east - b.west) * fx,
        ))
    }

    /// Nearest record marker within `tolerance` degrees of `point`
    pub fn hit_test(&self, point: LatLng, tolerance: f64) -> Option<usize> {
        let scale = point.lat.to_radians().cos().abs();

        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.record_id().is_some())
            .map(|(i, m)| {
                let dx = (m.position.lng - point.lng) * scale;
                let dy = m.position.lat - point.lat;
                (i, (dx * dx + dy * dy).sqrt())
            })
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl MapHandle for TerminalMap {
    fn set_center(&mut self, center: LatLng, zoom: f64, options: CenterOptions) {
        self.set_center_at(center, zoom, options, Instant::now());
    }

    fn markers(&self) -> &[Marker] {
        &self.markers
    }

    fn open_balloon(&mut self, index: usize) {
        if let Some(marker) = self.markers.get_mut(index) {
            marker.balloon_open = true;
        }
    }

    fn close_balloon(&mut self, index: usize) {
        if let Some(marker) = self.markers.get_mut(index) {
            marker.balloon_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<Marker> {
        vec![
            Marker::record(1, LatLng::new(47.0, 38.0), "one"),
            Marker::record(2, LatLng::new(47.1, 38.1), "two"),
            Marker::record(3, LatLng::new(47.1, 38.1), "three"),
            Marker::user(LatLng::new(47.1, 38.1)),
        ]
    }

    #[test]
    fn test_open_set_includes_stacked_markers_only() {
        let open = open_set(Some(LatLng::new(47.1, 38.1)), &markers());
        assert_eq!(open.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_open_set_empty_without_selection() {
        assert!(open_set(None, &markers()).is_empty());
    }

    #[test]
    fn test_sweep_closes_previous_balloon() {
        let mut map = TerminalMap::default();
        map.set_markers(markers());

        sync_balloons(&mut map, Some(LatLng::new(47.0, 38.0)));
        assert!(map.markers()[0].balloon_open);

        sync_balloons(&mut map, Some(LatLng::new(47.1, 38.1)));
        let open: Vec<bool> = map.markers().iter().map(|m| m.balloon_open).collect();
        assert_eq!(open, vec![false, true, true, false]);

        // Sweeping again changes nothing
        sync_balloons(&mut map, Some(LatLng::new(47.1, 38.1)));
        let again: Vec<bool> = map.markers().iter().map(|m| m.balloon_open).collect();
        assert_eq!(open, again);
    }

    #[test]
    fn test_pan_animation_interpolates() {
        let mut map = TerminalMap::new(LatLng::new(0.0, 0.0), 10.0);
        let start = Instant::now();
        map.set_center_at(
            LatLng::new(10.0, 20.0),
            10.0,
            CenterOptions::animated(Duration::from_millis(500)),
            start,
        );

        let mid = map.center_at(start + Duration::from_millis(250));
        assert!((mid.lat - 5.0).abs() < 1e-9);
        assert!((mid.lng - 10.0).abs() < 1e-9);
        assert!(map.is_animating(start + Duration::from_millis(250)));

        let end = map.center_at(start + Duration::from_millis(600));
        assert_eq!(end, LatLng::new(10.0, 20.0));
        assert!(!map.is_animating(start + Duration::from_millis(600)));
    }

    #[test]
    fn test_zoom_range_is_checked() {
        let mut map = TerminalMap::default();
        map.set_center(DEFAULT_CENTER, 40.0, CenterOptions::default());
        assert_eq!(map.zoom(), MAX_ZOOM);

        map.set_center(
            DEFAULT_CENTER,
            40.0,
            CenterOptions {
                duration: None,
                check_zoom_range: false,
            },
        );
        assert_eq!(map.zoom(), 40.0);
    }

    #[test]
    fn test_cell_round_trip_hits_marker() {
        let mut map = TerminalMap::default();
        map.set_markers(vec![Marker::record(9, DEFAULT_CENTER, "center")]);

        let area = CellArea { x: 10, y: 5, width: 41, height: 21 };
        let now = Instant::now();
        let point = map.cell_to_geo(now, area, 30, 15).unwrap();

        assert!((point.lat - DEFAULT_CENTER.lat).abs() < map.degrees_per_cell());
        assert!((point.lng - DEFAULT_CENTER.lng).abs() < map.degrees_per_cell());
        assert_eq!(map.hit_test(point, map.degrees_per_cell() * 2.0), Some(0));
        assert!(map.cell_to_geo(now, area, 9, 15).is_none());
    }

    #[test]
    fn test_hit_test_ignores_user_marker_and_far_points() {
        let mut map = TerminalMap::default();
        map.set_markers(vec![
            Marker::user(LatLng::new(1.0, 1.0)),
            Marker::record(5, LatLng::new(1.0, 1.001), "near"),
        ]);

        assert_eq!(map.hit_test(LatLng::new(1.0, 1.0), 0.01), Some(1));
        assert_eq!(map.hit_test(LatLng::new(2.0, 2.0), 0.01), None);
    }

    #[test]
    fn test_bounds_are_centered() {
        let map = TerminalMap::default();
        let b = map.bounds(Instant::now(), 80, 24);
        assert!(b.contains(DEFAULT_CENTER));
        assert!(((b.west + b.east) / 2.0 - DEFAULT_CENTER.lng).abs() < 1e-9);
        assert!(b.north - b.south > 0.0);
    }
}
