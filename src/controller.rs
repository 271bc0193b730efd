// 🎯 Selection Sync - single owner of list/map selection state
//
// List clicks and marker clicks both go through `select`, so there is one
// state transition per user action and one selected id.

use crate::geo::GeoError;
use crate::map::{
    sync_balloons, CenterOptions, MapHandle, Marker, TerminalMap, PAN_DURATION, SELECT_ZOOM,
};
use crate::record::{place_type, LatLng, Record, RecordId};
use crate::source::FetchError;

/// Rows per table page
pub const DEFAULT_PAGE_SIZE: usize = 7;

/// Joins the texts of records stacked on one marker
pub const BALLOON_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOrigin {
    List,
    Map,
}

#[derive(Debug, Clone)]
pub struct SelectionSyncController {
    records: Vec<Record>,
    loading: bool,
    error: Option<FetchError>,
    filter: Option<String>,
    page: usize,
    page_size: usize,
    selection: Option<RecordId>,
    user_coords: Option<LatLng>,
    geo_error: Option<GeoError>,
}

impl Default for SelectionSyncController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl SelectionSyncController {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            loading: true,
            error: None,
            filter: None,
            page: 1,
            page_size: page_size.max(1),
            selection: None,
            user_coords: None,
            geo_error: None,
        }
    }

    // ========================================================================
    // ASYNC COMPLETIONS
    // ========================================================================

    /// Replace the record list wholesale
    pub fn on_fetch_complete(&mut self, records: Vec<Record>) {
        tracing::info!(count = records.len(), "records loaded");

        self.records = records;
        self.loading = false;
        self.error = None;

        if let Some(id) = self.selection {
            if !self.selection_matches() {
                tracing::debug!(id, "selection dropped after refetch");
                self.selection = None;
            }
        }
        self.page = self.clamp_page(self.page);
    }

    pub fn on_fetch_failed(&mut self, error: FetchError) {
        tracing::error!(%error, "record fetch failed");
        self.loading = false;
        self.error = Some(error);
    }

    pub fn on_location(&mut self, result: Result<LatLng, GeoError>) {
        match result {
            Ok(coords) => {
                tracing::info!(lat = coords.lat, lng = coords.lng, "user located");
                self.user_coords = Some(coords);
                self.geo_error = None;
            }
            Err(error) => {
                tracing::warn!(%error, "geolocation failed");
                self.geo_error = Some(error);
            }
        }
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    pub fn select_from_list<M: MapHandle + ?Sized>(&mut self, id: RecordId, map: &mut M) -> bool {
        self.select(id, SelectOrigin::List, map)
    }

    pub fn select_from_map<M: MapHandle + ?Sized>(&mut self, id: RecordId, map: &mut M) -> bool {
        self.select(id, SelectOrigin::Map, map)
    }

    /// Returns `false` and leaves state untouched for an unknown id
    fn select<M: MapHandle + ?Sized>(
        &mut self,
        id: RecordId,
        origin: SelectOrigin,
        map: &mut M,
    ) -> bool {
        let Some(record) = self.record(id) else {
            tracing::warn!(id, ?origin, "select ignored: unknown record");
            return false;
        };
        let position = record.position();
        let hidden = self
            .filter
            .as_deref()
            .map(|category| !record.matches_category(category))
            .unwrap_or(false);

        if hidden {
            tracing::debug!(id, "selected record hidden by filter, clearing it");
            self.filter = None;
        }

        self.selection = Some(id);
        if let Some(page) = self.page_of(id) {
            self.page = page;
        }

        map.set_center(position, SELECT_ZOOM, CenterOptions::animated(PAN_DURATION));
        tracing::debug!(id, ?origin, page = self.page, "record selected");
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<RecordId> {
        self.selection
    }

    pub fn is_selected(&self, id: RecordId) -> bool {
        self.selection == Some(id)
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.selection.and_then(|id| self.record(id))
    }

    pub fn selected_position(&self) -> Option<LatLng> {
        self.selected_record().map(Record::position)
    }

    /// Rebuild the map's markers from the visible records and sweep balloons
    pub fn sync_map(&self, map: &mut TerminalMap) {
        map.set_markers(self.marker_specs());
        sync_balloons(map, self.selected_position());
    }

    // ========================================================================
    // FILTER & PAGING
    // ========================================================================

    pub fn set_filter(&mut self, category: Option<String>) {
        self.filter = category;
        self.page = 1;

        if !self.selection_matches() {
            self.selection = None;
        }
    }

    /// Selected id still names a loaded record that passes the filter
    fn selection_matches(&self) -> bool {
        match (self.selection, self.selected_record()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(record)) => self
                .filter
                .as_deref()
                .map_or(true, |category| record.matches_category(category)),
        }
    }

    /// Returns `false` when the clamped page is already current
    pub fn set_page(&mut self, n: usize) -> bool {
        let page = self.clamp_page(n);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    fn clamp_page(&self, n: usize) -> usize {
        n.clamp(1, self.page_count())
    }

    /// At least one page, even for an empty list
    pub fn page_count(&self) -> usize {
        let count = self.visible_records().count();
        count.div_ceil(self.page_size).max(1)
    }

    /// Page holding `id` under the current filter
    pub fn page_of(&self, id: RecordId) -> Option<usize> {
        self.visible_records()
            .position(|r| r.id == id)
            .map(|index| index / self.page_size + 1)
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter().filter(move |r| match &self.filter {
            Some(category) => r.matches_category(category),
            None => true,
        })
    }

    pub fn page_records(&self) -> Vec<&Record> {
        self.visible_records()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Balloon text of every record at exactly (`lat`, `lng`), in list order
    pub fn balloon_content_for(&self, lat: f64, lng: f64) -> String {
        self.records
            .iter()
            .filter(|r| r.is_at(lat, lng))
            .map(Record::balloon_text)
            .collect::<Vec<_>>()
            .join(BALLOON_SEPARATOR)
    }

    /// Name of the first record at (`lat`, `lng`)
    pub fn balloon_title_for(&self, lat: f64, lng: f64) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.is_at(lat, lng))
            .map(|r| r.name.as_str())
    }

    /// Markers for the visible records, plus the user when located
    pub fn marker_specs(&self) -> Vec<Marker> {
        let mut markers: Vec<Marker> = self
            .visible_records()
            .map(|r| {
                let color = r
                    .category
                    .as_deref()
                    .and_then(place_type)
                    .map(|p| p.color);
                Marker::record(r.id, r.position(), r.name.clone()).with_color(color)
            })
            .collect();

        if let Some(coords) = self.user_coords {
            markers.push(Marker::user(coords));
        }
        markers
    }

    /// Distinct categories in first-seen order, with record counts
    pub fn categories(&self) -> Vec<(String, usize)> {
        let mut result: Vec<(String, usize)> = Vec::new();
        for category in self.records.iter().filter_map(|r| r.category.as_deref()) {
            match result.iter_mut().find(|(c, _)| c == category) {
                Some(entry) => entry.1 += 1,
                None => result.push((category.to_string(), 1)),
            }
        }
        result
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.records.iter().filter(|r| r.matches_category(category)).count()
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn user_coords(&self) -> Option<LatLng> {
        self.user_coords
    }

    pub fn geo_error(&self) -> Option<GeoError> {
        self.geo_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sight;

    const MUSEUMS: &str = "Музеи";
    const PARKS: &str = "Парки и природные объекты";

    fn loaded(count: usize) -> SelectionSyncController {
        let records = (1..=count as i64)
            .map(|i| {
                let category = if i % 2 == 0 { PARKS } else { MUSEUMS };
                sight(i, &format!("Sight {}", i), 47.0 + i as f64 / 100.0, 38.9, category)
            })
            .collect();

        let mut controller = SelectionSyncController::new(7);
        controller.on_fetch_complete(records);
        controller
    }

    #[test]
    fn test_starts_loading() {
        let controller = SelectionSyncController::default();
        assert!(controller.is_loading());
        assert_eq!(controller.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(controller.page_count(), 1);
    }

    #[test]
    fn test_select_from_list_sets_selection_and_page() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();

        let ids: Vec<RecordId> = controller.records().iter().map(|r| r.id).collect();
        for id in ids {
            assert!(controller.select_from_list(id, &mut map));
            assert_eq!(controller.selection(), Some(id));
            assert_eq!(controller.page_of(id), Some(controller.page()));
            assert_eq!(map.center(), controller.record(id).unwrap().position());
        }
    }

    #[test]
    fn test_marker_click_on_tenth_record_moves_to_page_two() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        assert_eq!(controller.page_count(), 3);

        assert!(controller.select_from_map(10, &mut map));
        assert_eq!(controller.page(), 2);
        assert!(controller.is_selected(10));
        assert!(controller.page_records().iter().any(|r| r.id == 10));
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut controller = loaded(3);
        let mut map = TerminalMap::default();
        controller.select_from_list(2, &mut map);

        assert!(!controller.select_from_map(99, &mut map));
        assert_eq!(controller.selection(), Some(2));
    }

    #[test]
    fn test_selecting_filtered_out_record_clears_filter() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        controller.set_filter(Some(MUSEUMS.to_string()));

        assert!(controller.select_from_map(14, &mut map));
        assert_eq!(controller.filter(), None);
        assert_eq!(controller.page(), 2);
    }

    #[test]
    fn test_page_uses_filtered_index() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        controller.set_filter(Some(PARKS.to_string()));

        // Parks are 2, 4, .., 14; record 14 is the 7th park
        controller.select_from_map(14, &mut map);
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.page_count(), 1);
    }

    #[test]
    fn test_set_filter_is_idempotent() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        controller.select_from_list(3, &mut map);
        controller.set_page(2);

        controller.set_filter(Some(MUSEUMS.to_string()));
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.selection(), Some(3));

        controller.set_filter(Some(MUSEUMS.to_string()));
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.selection(), Some(3));
    }

    #[test]
    fn test_set_filter_drops_non_matching_selection() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        controller.select_from_list(3, &mut map);

        controller.set_filter(Some(PARKS.to_string()));
        assert_eq!(controller.selection(), None);
        assert!(controller.visible_records().all(|r| r.matches_category(PARKS)));

        controller.set_filter(None);
        assert_eq!(controller.visible_records().count(), 15);
    }

    #[test]
    fn test_set_page_twice_is_noop() {
        let mut controller = loaded(15);
        assert!(controller.set_page(2));
        let before = format!("{:?}", controller);

        assert!(!controller.set_page(2));
        assert_eq!(format!("{:?}", controller), before);
    }

    #[test]
    fn test_set_page_clamps() {
        let mut controller = loaded(15);

        controller.set_page(0);
        assert_eq!(controller.page(), 1);

        controller.set_page(42);
        assert_eq!(controller.page(), 3);
        assert_eq!(controller.page_records().len(), 1);

        assert!(!controller.next_page());
        assert!(controller.previous_page());
        assert_eq!(controller.page(), 2);
    }

    #[test]
    fn test_balloon_content_stacks_in_list_order() {
        let mut controller = SelectionSyncController::default();
        controller.on_fetch_complete(vec![
            sight(1, "First", 47.5, 38.5, MUSEUMS),
            sight(2, "Elsewhere", 47.6, 38.6, MUSEUMS),
            sight(3, "Second", 47.5, 38.5, PARKS),
        ]);

        assert_eq!(
            controller.balloon_content_for(47.5, 38.5),
            format!("About First{}About Second", BALLOON_SEPARATOR)
        );
        assert_eq!(controller.balloon_title_for(47.5, 38.5), Some("First"));
        assert_eq!(controller.balloon_content_for(0.0, 0.0), "");
    }

    #[test]
    fn test_refetch_keeps_valid_selection_and_clamps_page() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        controller.select_from_map(15, &mut map);
        assert_eq!(controller.page(), 3);

        let mut fewer = controller.records()[..8].to_vec();
        controller.on_fetch_complete(fewer.clone());
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.page(), 2);

        controller.select_from_list(2, &mut map);
        fewer.reverse();
        controller.on_fetch_complete(fewer);
        assert_eq!(controller.selection(), Some(2));
    }

    #[test]
    fn test_refetch_drops_selection_that_left_the_filter() {
        let mut controller = loaded(15);
        let mut map = TerminalMap::default();
        controller.set_filter(Some(MUSEUMS.to_string()));
        controller.select_from_list(3, &mut map);

        let mut records = controller.records().to_vec();
        records[2].category = Some(PARKS.to_string());
        controller.on_fetch_complete(records.clone());
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.filter(), Some(MUSEUMS));

        controller.select_from_list(5, &mut map);
        controller.on_fetch_complete(records);
        assert_eq!(controller.selection(), Some(5));
    }

    #[test]
    fn test_fetch_error_state() {
        let mut controller = SelectionSyncController::default();
        controller.on_fetch_failed(FetchError::Status(500));

        assert!(!controller.is_loading());
        assert_eq!(
            controller.error().map(ToString::to_string).as_deref(),
            Some("Request failed with status code 500")
        );

        controller.on_fetch_complete(Vec::new());
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_location_updates_are_independent() {
        let mut controller = loaded(2);
        controller.on_location(Err(GeoError::PermissionDenied));
        assert_eq!(controller.geo_error(), Some(GeoError::PermissionDenied));
        assert_eq!(controller.records().len(), 2);

        controller.on_location(Ok(LatLng::new(47.2, 38.9)));
        assert_eq!(controller.geo_error(), None);
        assert!(controller.marker_specs().iter().any(|m| m.record_id().is_none()));
    }

    #[test]
    fn test_sync_map_opens_selected_marker() {
        let mut controller = loaded(5);
        let mut map = TerminalMap::default();
        controller.select_from_list(4, &mut map);

        controller.sync_map(&mut map);
        let open: Vec<_> = map
            .markers()
            .iter()
            .filter(|m| m.balloon_open)
            .filter_map(|m| m.record_id())
            .collect();
        assert_eq!(open, vec![4]);
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        let controller = loaded(5);
        assert_eq!(
            controller.categories(),
            vec![(MUSEUMS.to_string(), 3), (PARKS.to_string(), 2)]
        );
        assert_eq!(controller.category_count(PARKS), 2);
    }
}
