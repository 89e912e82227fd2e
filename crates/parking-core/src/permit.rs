//! Permit catalog entries and time-windowed permits
//!
//! A permit's validity is never stored: it is derived from its closed window
//! `[active_from, expires_at]` and its `deleted` flag at the instant asked.
//! For any vehicle, the windows of its non-deleted permits never intersect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParkingError, Result};

/// How long a permit of a given type lasts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DurationClass {
    /// Valid until the end of the calendar day of `active_from`
    Day,
    /// A class with no expiry rule yet (semester, annual, ...)
    Other(String),
}

impl DurationClass {
    pub fn as_str(&self) -> &str {
        match self {
            DurationClass::Day => "day",
            DurationClass::Other(name) => name,
        }
    }
}

impl From<String> for DurationClass {
    fn from(value: String) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized == "day" {
            DurationClass::Day
        } else {
            DurationClass::Other(normalized)
        }
    }
}

impl From<DurationClass> for String {
    fn from(class: DurationClass) -> Self {
        class.as_str().to_string()
    }
}

impl std::fmt::Display for DurationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry describing a purchasable permit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitType {
    pub id: Uuid,
    pub class_name: String,
    pub duration_class: DurationClass,
    /// Price in cents
    pub price_cents: i64,
    #[serde(default)]
    pub deleted: bool,
}

/// Admin request to add a catalog entry
#[derive(Debug, Clone, Deserialize)]
pub struct NewPermitType {
    pub class_name: String,
    pub duration_class: String,
    pub price_cents: i64,
}

impl NewPermitType {
    pub fn into_permit_type(self) -> Result<PermitType> {
        let class_name = self.class_name.trim();
        if class_name.is_empty() {
            return Err(ParkingError::invalid("class_name", "must not be empty"));
        }
        if self.duration_class.trim().is_empty() {
            return Err(ParkingError::invalid("duration_class", "must not be empty"));
        }
        validate_price(self.price_cents)?;

        Ok(PermitType {
            id: Uuid::new_v4(),
            class_name: class_name.to_string(),
            duration_class: DurationClass::from(self.duration_class),
            price_cents: self.price_cents,
            deleted: false,
        })
    }
}

/// Prices are whole cents and never negative
pub fn validate_price(price_cents: i64) -> Result<()> {
    if price_cents < 0 {
        return Err(ParkingError::invalid("price_cents", "must not be negative"));
    }
    Ok(())
}

/// Closed time interval during which a permit is valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitWindow {
    pub active_from: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PermitWindow {
    pub fn new(active_from: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<Self> {
        if expires_at < active_from {
            return Err(ParkingError::InvertedWindow {
                active_from: active_from.to_rfc3339(),
                expires_at: expires_at.to_rfc3339(),
            });
        }
        Ok(Self {
            active_from,
            expires_at,
        })
    }

    /// Derive the window for a permit of `class` starting at `active_from`
    ///
    /// Day passes end at 23:59:00 UTC on the calendar day of `active_from`.
    pub fn for_class(class: &DurationClass, active_from: DateTime<Utc>) -> Result<Self> {
        match class {
            DurationClass::Day => {
                let end_of_day = active_from
                    .date_naive()
                    .and_hms_opt(23, 59, 0)
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| {
                        ParkingError::invalid("active_from", "cannot compute end of day")
                    })?;
                Self::new(active_from, end_of_day)
            }
            DurationClass::Other(name) => {
                Err(ParkingError::UnsupportedDurationClass(name.clone()))
            }
        }
    }

    /// Boundary-inclusive membership test
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.active_from <= at && at <= self.expires_at
    }

    /// Closed intervals intersect, including a shared endpoint
    pub fn overlaps(&self, other: &PermitWindow) -> bool {
        self.active_from <= other.expires_at && other.active_from <= self.expires_at
    }
}

/// A permit issued to a driver for one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub id: Uuid,
    pub holder_id: Uuid,
    pub vehicle_id: Uuid,
    pub permit_type_id: Uuid,
    pub active_from: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Permit {
    pub fn new(holder_id: Uuid, vehicle_id: Uuid, permit_type_id: Uuid, window: PermitWindow) -> Self {
        Self {
            id: Uuid::new_v4(),
            holder_id,
            vehicle_id,
            permit_type_id,
            active_from: window.active_from,
            expires_at: window.expires_at,
            deleted: false,
        }
    }

    pub fn window(&self) -> PermitWindow {
        PermitWindow {
            active_from: self.active_from,
            expires_at: self.expires_at,
        }
    }

    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        !self.deleted && self.window().contains(at)
    }

    /// Would storing both permits break the no-overlap rule?
    pub fn conflicts_with(&self, other: &Permit) -> bool {
        self.vehicle_id == other.vehicle_id
            && !self.deleted
            && !other.deleted
            && self.window().overlaps(&other.window())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 22, h, m, s).unwrap()
    }

    #[test]
    fn test_day_pass_expires_end_of_day() {
        let window = PermitWindow::for_class(&DurationClass::Day, at(0, 0, 0)).unwrap();
        assert_eq!(window.expires_at, at(23, 59, 0));

        let late_start = PermitWindow::for_class(&DurationClass::Day, at(14, 28, 30)).unwrap();
        assert_eq!(late_start.expires_at, at(23, 59, 0));
    }

    #[test]
    fn test_day_pass_after_cutoff_is_rejected() {
        let result = PermitWindow::for_class(&DurationClass::Day, at(23, 59, 30));
        assert!(matches!(result, Err(ParkingError::InvertedWindow { .. })));
    }

    #[test]
    fn test_other_duration_classes_have_no_rule() {
        let result = PermitWindow::for_class(&DurationClass::from("Semester".to_string()), at(8, 0, 0));
        assert_eq!(
            result,
            Err(ParkingError::UnsupportedDurationClass("semester".into()))
        );
    }

    #[test]
    fn test_window_contains_is_boundary_inclusive() {
        let window = PermitWindow::new(at(8, 0, 0), at(17, 0, 0)).unwrap();
        assert!(window.contains(at(8, 0, 0)));
        assert!(window.contains(at(17, 0, 0)));
        assert!(!window.contains(at(7, 59, 59)));
        assert!(!window.contains(at(17, 0, 1)));
    }

    #[test]
    fn test_touching_windows_overlap() {
        let morning = PermitWindow::new(at(8, 0, 0), at(12, 0, 0)).unwrap();
        let afternoon = PermitWindow::new(at(12, 0, 0), at(17, 0, 0)).unwrap();
        let evening = PermitWindow::new(at(12, 0, 1), at(20, 0, 0)).unwrap();

        assert!(morning.overlaps(&afternoon));
        assert!(!morning.overlaps(&evening));
    }

    #[test]
    fn test_deleted_permits_never_conflict() {
        let vehicle = Uuid::new_v4();
        let window = PermitWindow::new(at(8, 0, 0), at(12, 0, 0)).unwrap();
        let first = Permit::new(Uuid::new_v4(), vehicle, Uuid::new_v4(), window);
        let mut second = Permit::new(Uuid::new_v4(), vehicle, Uuid::new_v4(), window);

        assert!(first.conflicts_with(&second));
        second.deleted = true;
        assert!(!first.conflicts_with(&second));
        assert!(!second.is_valid_at(at(9, 0, 0)));
    }

    #[test]
    fn test_permit_type_validation() {
        let ok = NewPermitType {
            class_name: "Visitor".into(),
            duration_class: "DAY".into(),
            price_cents: 1200,
        }
        .into_permit_type()
        .unwrap();
        assert_eq!(ok.duration_class, DurationClass::Day);

        let negative = NewPermitType {
            class_name: "Visitor".into(),
            duration_class: "day".into(),
            price_cents: -1,
        };
        assert!(negative.into_permit_type().is_err());
    }
}
