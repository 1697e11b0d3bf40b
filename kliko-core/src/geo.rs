//! Great-circle proximity queries over a container collection.

use crate::model::{Container, Coordinates, NeighborResult, RegistrationNumber};

/// Earth radius used for all distance computations, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// Haversine distance between two points in kilometres.
#[must_use]
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let from_lat = from.latitude.to_radians();
    let to_lat = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (delta_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * half_chord.sqrt().asin()
}

/// Coordinates of the first container registered as `reference`.
///
/// Returns `None` when no container matches or the first match lacks usable
/// coordinates; later duplicates are not consulted.
#[must_use]
pub fn resolve_coordinates(
    containers: &[Container],
    reference: &RegistrationNumber,
) -> Option<Coordinates> {
    containers
        .iter()
        .find(|container| container.is_registered_as(reference))
        .and_then(Container::coordinates)
}

/// Containers within `radius_km` of `center`, in source order.
///
/// The boundary is inclusive, so a container sitting on `center` (including
/// the reference container itself) is always part of the output for any
/// non-negative radius. Containers without usable coordinates are skipped.
/// Results are produced lazily.
pub fn containers_within_radius(
    containers: &[Container],
    center: Coordinates,
    radius_km: f64,
) -> impl Iterator<Item = NeighborResult> + '_ {
    containers.iter().filter_map(move |container| {
        let distance = haversine_km(center, container.coordinates()?);
        (distance <= radius_km).then(|| NeighborResult::from_container(container, distance))
    })
}
