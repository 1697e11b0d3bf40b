//! Domain data structures for operators, containers, and proximity results.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Identifier for a container operator known to kliko.
pub struct OperatorId(pub String);

#[derive(Debug, Clone)]
/// Metadata describing an operator and the page its container map lives on.
pub struct OperatorMeta {
    /// Unique identifier.
    pub id: OperatorId,
    /// Human-friendly name.
    pub name: String,
    /// Page embedding the container data.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Registration number identifying one container within a snapshot.
pub struct RegistrationNumber(pub String);

impl RegistrationNumber {
    /// Canonical form of a numeric container id: plain decimal, no padding.
    #[must_use]
    pub fn from_id(id: u64) -> Self {
        Self(id.to_string())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// A point on the globe in degrees.
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Construct a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
/// Upstream district record, passed through untouched.
pub struct District(pub Value);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
/// One physical collection unit as published by the operator.
///
/// Field values of an unexpected type decode as absent instead of failing the
/// whole payload.
pub struct Container {
    /// Join key for reference lookups.
    #[serde(
        rename = "sRegistrationNumber",
        default,
        deserialize_with = "lenient::registration"
    )]
    pub registration_number: Option<RegistrationNumber>,
    /// Latitude in degrees.
    #[serde(rename = "dLatitude", default, deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(rename = "dLongitude", default, deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
    /// Current fullness indicator.
    #[serde(
        rename = "dFillingDegree",
        default,
        deserialize_with = "lenient::number"
    )]
    pub filling_degree: Option<f64>,
    /// Date the container was last emptied, as published.
    #[serde(
        rename = "sDateLastEmptied",
        default,
        deserialize_with = "lenient::text"
    )]
    pub last_emptied: Option<String>,
    /// Whether the container was emptied today.
    #[serde(rename = "bIsEmptiedToday", default, deserialize_with = "lenient::flag")]
    pub emptied_today: Option<bool>,
    /// Container type or category label.
    #[serde(rename = "sProductName", default, deserialize_with = "lenient::text")]
    pub product_name: Option<String>,
}

impl Container {
    /// Location of the container, if both coordinates are usable.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(Coordinates::new(latitude, longitude))
            }
            _ => None,
        }
    }

    /// Check whether this container carries the given registration number.
    #[must_use]
    pub fn is_registered_as(&self, number: &RegistrationNumber) -> bool {
        self.registration_number.as_ref() == Some(number)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Structured content decoded from one snapshot.
pub struct Records {
    /// District records, empty when the payload declared none.
    pub districts: Vec<District>,
    /// Container records in source order.
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A container found within the query radius.
pub struct NeighborResult {
    /// Registration number of the neighbour.
    #[serde(rename = "sRegistrationNumber")]
    pub registration_number: Option<RegistrationNumber>,
    /// Great-circle distance to the query center in kilometres.
    pub distance: f64,
    /// Current fullness indicator.
    #[serde(rename = "dFillingDegree")]
    pub filling_degree: Option<f64>,
    /// Date the container was last emptied.
    #[serde(rename = "sDateLastEmptied")]
    pub last_emptied: Option<String>,
    /// Whether the container was emptied today.
    #[serde(rename = "bIsEmptiedToday")]
    pub emptied_today: Option<bool>,
    /// Container type or category label.
    #[serde(rename = "sProductName")]
    pub product_name: Option<String>,
}

impl NeighborResult {
    pub(crate) fn from_container(container: &Container, distance: f64) -> Self {
        Self {
            registration_number: container.registration_number.clone(),
            distance,
            filling_degree: container.filling_degree,
            last_emptied: container.last_emptied.clone(),
            emptied_today: container.emptied_today,
            product_name: container.product_name.clone(),
        }
    }
}

// Field decoders that map unexpected JSON types to `None`.
mod lenient {
    use super::{Deserialize, Deserializer, RegistrationNumber, Value};

    pub(super) fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }

    pub(super) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(flag) => Some(flag),
            _ => None,
        })
    }

    pub(super) fn registration<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RegistrationNumber>, D::Error> {
        Ok(text(deserializer)?.map(RegistrationNumber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_number_from_id_is_plain_decimal() {
        assert_eq!(RegistrationNumber::from_id(42).as_str(), "42", "no padding");
        assert_eq!(RegistrationNumber::from_id(0).as_str(), "0", "zero stays zero");
    }

    #[test]
    fn test_container_decodes_upstream_keys() {
        let container: Container = serde_json::from_str(
            r#"{
                "sRegistrationNumber": "1001",
                "dLatitude": 52.38,
                "dLongitude": 4.63,
                "dFillingDegree": 40,
                "sDateLastEmptied": "2024-03-01",
                "bIsEmptiedToday": false,
                "sProductName": "Papier",
                "iUnrelated": 7
            }"#,
        )
        .expect("container should decode");

        assert_eq!(
            container.registration_number,
            Some(RegistrationNumber("1001".to_owned())),
            "registration number"
        );
        assert_eq!(
            container.coordinates(),
            Some(Coordinates::new(52.38, 4.63)),
            "coordinates"
        );
        assert_eq!(container.filling_degree, Some(40.0), "filling degree");
        assert_eq!(container.emptied_today, Some(false), "emptied flag");
        assert_eq!(container.product_name.as_deref(), Some("Papier"), "product");
    }

    #[test]
    fn test_container_tolerates_bad_field_types() {
        let container: Container = serde_json::from_str(
            r#"{
                "sRegistrationNumber": 77,
                "dLatitude": null,
                "dLongitude": {"nested": true},
                "dFillingDegree": "55.5",
                "bIsEmptiedToday": "yes"
            }"#,
        )
        .expect("container should decode");

        assert_eq!(
            container.registration_number,
            Some(RegistrationNumber::from_id(77)),
            "integer id rendered as decimal"
        );
        assert!(container.coordinates().is_none(), "no usable coordinates");
        assert_eq!(container.filling_degree, Some(55.5), "numeric string accepted");
        assert_eq!(container.emptied_today, None, "non-bool flag dropped");
        assert_eq!(container.last_emptied, None, "missing field is absent");
    }

    #[test]
    fn test_neighbor_result_serializes_with_upstream_keys() {
        let container = Container {
            registration_number: Some(RegistrationNumber::from_id(5)),
            filling_degree: Some(12.0),
            product_name: Some("Glas".to_owned()),
            ..Container::default()
        };
        let json = serde_json::to_value(NeighborResult::from_container(&container, 0.5))
            .expect("result should serialize");

        assert_eq!(json.get("sRegistrationNumber"), Some(&Value::from("5")), "id key");
        assert_eq!(json.get("distance"), Some(&Value::from(0.5)), "distance key");
        assert_eq!(json.get("sProductName"), Some(&Value::from("Glas")), "product key");
        assert_eq!(json.get("bIsEmptiedToday"), Some(&Value::Null), "null flag kept");
    }
}
