//! Identity and natural-key types shared across the parking services

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParkingError, Result};

/// The three actor classes, each backed by its own credential table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Enforcer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Driver, Role::Enforcer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Enforcer => "enforcer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "driver" => Ok(Role::Driver),
            "enforcer" => Ok(Role::Enforcer),
            "admin" => Ok(Role::Admin),
            other => Err(ParkingError::invalid("role", format!("unknown role '{}'", other))),
        }
    }
}

/// An authenticated actor
///
/// A principal lives in exactly one role table; the same person holding two
/// roles has two unrelated principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub display_name: String,
    /// Contact address used for best-effort notifications
    pub email: String,
    pub role: Role,
}

/// Where to send a notification about a principal's vehicle, permit or ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub principal_id: Uuid,
    pub display_name: String,
    pub email: String,
}

impl From<&Principal> for Contact {
    fn from(principal: &Principal) -> Self {
        Self {
            principal_id: principal.id,
            display_name: principal.display_name.clone(),
            email: principal.email.clone(),
        }
    }
}

/// A licence plate, normalized to upper case with separators removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plate(String);

impl Plate {
    pub const MAX_LEN: usize = 8;

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(ParkingError::invalid("plate", "must not be empty"));
        }
        if normalized.len() > Self::MAX_LEN {
            return Err(ParkingError::invalid(
                "plate",
                format!("at most {} characters", Self::MAX_LEN),
            ));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ParkingError::invalid("plate", "only letters and digits are allowed"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Plate {
    type Error = ParkingError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Plate> for String {
    fn from(plate: Plate) -> Self {
        plate.0
    }
}

impl std::fmt::Display for Plate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-letter issuing state or province of a plate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ParkingError::invalid("state", "expected a two-letter code"));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegionCode {
    type Error = ParkingError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Natural key of a vehicle among non-deleted registrations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleKey {
    pub plate: Plate,
    pub state: RegionCode,
}

impl VehicleKey {
    pub fn new(plate: Plate, state: RegionCode) -> Self {
        Self { plate, state }
    }

    /// Parse both halves of the key from raw caller input
    pub fn parse(plate: &str, state: &str) -> Result<Self> {
        Ok(Self {
            plate: Plate::parse(plate)?,
            state: RegionCode::parse(state)?,
        })
    }
}

impl std::fmt::Display for VehicleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.state, self.plate)
    }
}
