//! Vehicle records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParkingError, Result};
use crate::types::{Plate, RegionCode, VehicleKey};

/// Oldest model year accepted at registration
pub const MIN_MODEL_YEAR: i32 = 1900;

/// Newest model year accepted at registration
pub const MAX_MODEL_YEAR: i32 = 2100;

/// A registered vehicle
///
/// `deleted` is a soft-delete flag: once set, the `(plate, state)` key may be
/// registered again by anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: Plate,
    pub state: RegionCode,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub owner_id: Uuid,
    #[serde(default)]
    pub deleted: bool,
}

impl Vehicle {
    pub fn key(&self) -> VehicleKey {
        VehicleKey::new(self.plate.clone(), self.state.clone())
    }

    pub fn is_owned_by(&self, driver_id: Uuid) -> bool {
        !self.deleted && self.owner_id == driver_id
    }
}

/// Registration request for a new vehicle
#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub plate: String,
    pub state: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
}

impl NewVehicle {
    /// Validate field shapes and build the record for `owner_id`
    pub fn into_vehicle(self, owner_id: Uuid) -> Result<Vehicle> {
        let key = VehicleKey::parse(&self.plate, &self.state)?;
        let make = required_text("make", &self.make)?;
        let model = required_text("model", &self.model)?;
        let color = required_text("color", &self.color)?;

        if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&self.year) {
            return Err(ParkingError::invalid(
                "year",
                format!("must be between {} and {}", MIN_MODEL_YEAR, MAX_MODEL_YEAR),
            ));
        }

        Ok(Vehicle {
            id: Uuid::new_v4(),
            plate: key.plate,
            state: key.state,
            make,
            model,
            year: self.year,
            color,
            owner_id,
            deleted: false,
        })
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParkingError::invalid(field, "must not be empty"));
    }
    if trimmed.len() > 64 {
        return Err(ParkingError::invalid(field, "at most 64 characters"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NewVehicle {
        NewVehicle {
            plate: "abc-123".into(),
            state: "wa".into(),
            make: "Subaru".into(),
            model: " Outback ".into(),
            year: 2019,
            color: "green".into(),
        }
    }

    #[test]
    fn test_new_vehicle_normalizes_fields() {
        let owner = Uuid::new_v4();
        let vehicle = request().into_vehicle(owner).unwrap();

        assert_eq!(vehicle.plate.as_str(), "ABC123");
        assert_eq!(vehicle.state.as_str(), "WA");
        assert_eq!(vehicle.model, "Outback");
        assert!(vehicle.is_owned_by(owner));
        assert!(!vehicle.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_new_vehicle_rejects_bad_year() {
        let mut req = request();
        req.year = 1850;
        assert!(matches!(
            req.into_vehicle(Uuid::new_v4()),
            Err(ParkingError::Validation { field: "year", .. })
        ));
    }

    #[test]
    fn test_new_vehicle_rejects_blank_make() {
        let mut req = request();
        req.make = "   ".into();
        assert!(req.into_vehicle(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_deleted_vehicle_has_no_owner() {
        let owner = Uuid::new_v4();
        let mut vehicle = request().into_vehicle(owner).unwrap();
        vehicle.deleted = true;
        assert!(!vehicle.is_owned_by(owner));
    }
}
