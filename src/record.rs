// 📍 Records - points of interest as delivered by the records endpoint
// One struct covers both payload shapes: city sights and bin fill sensors

use chrono::DateTime;
use serde::{Deserialize, Serialize};

pub type RecordId = i64;

/// Text used when a sight carries no description
pub const NO_DATA: &str = "No data";

// ============================================================================
// COORDINATES
// ============================================================================

/// Geographic coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,

    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(alias = "lat")]
    pub latitude: f64,

    #[serde(alias = "lng")]
    pub longitude: f64,

    /// Place type of a sight (wire name `type`)
    #[serde(default, rename = "type", alias = "category")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // ========================================================================
    // SENSOR FIELDS (absent for sights)
    // ========================================================================
    /// Fill level in percent
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,

    /// Battery level in percent
    #[serde(default, rename = "batLevel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bat_level: Option<f64>,

    /// Time of the last sensor report
    #[serde(default, rename = "timeAt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_at: Option<String>,
}

impl Record {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Exact coordinate match, used to stack records on one marker
    pub fn is_at(&self, lat: f64, lng: f64) -> bool {
        self.latitude == lat && self.longitude == lng
    }

    pub fn matches_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }

    pub fn is_sensor(&self) -> bool {
        self.percent.is_some() || self.bat_level.is_some() || self.time_at.is_some()
    }

    /// Last report time, reformatted when it parses as RFC 3339
    pub fn updated_display(&self) -> String {
        match self.time_at.as_deref() {
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
                Err(_) => raw.to_string(),
            },
            None => "-".to_string(),
        }
    }

    /// Descriptive text shown in this record's map balloon
    pub fn balloon_text(&self) -> String {
        if self.is_sensor() {
            format!(
                "ID: {}\nName: {}\nAddress: {}\nFill level: {}%\nBattery: {}%\nUpdated: {}",
                self.id,
                self.name,
                self.address,
                format_percent(self.percent),
                format_percent(self.bat_level),
                self.updated_display(),
            )
        } else {
            self.description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DATA.to_string())
        }
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

// ============================================================================
// PLACE TYPE CATALOG
// ============================================================================

/// One entry of the fixed sight category list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceType {
    pub id: u8,
    /// Category value exactly as the API sends it in `type`
    pub title: &'static str,
    /// Marker color name
    pub color: &'static str,
}

pub const PLACE_TYPES: [PlaceType; 10] = [
    PlaceType { id: 1, title: "Библиотеки", color: "red" },
    PlaceType { id: 2, title: "Исторические и архитектурные объекты", color: "blue" },
    PlaceType { id: 3, title: "Музеи", color: "green" },
    PlaceType { id: 4, title: "Памятники и скульптуры", color: "yellow" },
    PlaceType { id: 5, title: "Парки и природные объекты", color: "orange" },
    PlaceType { id: 6, title: "Развлечения", color: "violet" },
    PlaceType { id: 7, title: "Религиозные объекты", color: "black" },
    PlaceType { id: 8, title: "Театры", color: "purple" },
    PlaceType { id: 9, title: "Спортивные арены", color: "white" },
    PlaceType { id: 10, title: "Кафе, рестораны и бары", color: "lightgray" },
];

pub fn place_type(title: &str) -> Option<&'static PlaceType> {
    PLACE_TYPES.iter().find(|p| p.title == title)
}

#[cfg(test)]
pub(crate) fn sight(id: RecordId, name: &str, lat: f64, lng: f64, category: &str) -> Record {
    Record {
        id,
        name: name.to_string(),
        address: format!("{} street", name),
        latitude: lat,
        longitude: lng,
        category: Some(category.to_string()),
        description: Some(format!("About {}", name)),
        percent: None,
        bat_level: None,
        time_at: None,
    }
}
