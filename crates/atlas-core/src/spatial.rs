//! Spatial Engine: GeoJSON polygon validation, geodesic area, centroid, and
//! fractional exposure (spec.md §4.6). Hand-rolled over `serde_json::Value`
//! — no `geo`/`geo-types`/`geojson` crate appears anywhere in the retrieval
//! pack; this is grounded directly on `original_source/spatial_engine.py`'s
//! own fallback path (Shoelace with `cos(mean-lat)` correction), which is
//! the path that source actually exercises without `shapely`/`pyproj`.

use crate::error::AtlasError;
use crate::hazard::location_seed;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const LAT_TO_KM: f64 = 111.0;

#[derive(Debug, Clone, Copy)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// A validated polygon: one or more rings (exterior + holes), each a closed
/// ring of `(lon, lat)` vertices. `MultiPolygon` is flattened to its
/// constituent polygons' exterior rings for area/centroid purposes.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub rings: Vec<Vec<LonLat>>,
}

fn parse_ring(value: &Value) -> Result<Vec<LonLat>, AtlasError> {
    let coords = value.as_array().ok_or_else(|| {
        AtlasError::invalid("geometry", "ring must be an array of [lon, lat] pairs")
    })?;
    coords
        .iter()
        .map(|pair| {
            let arr = pair
                .as_array()
                .ok_or_else(|| AtlasError::invalid("geometry", "coordinate must be [lon, lat]"))?;
            let lon = arr
                .first()
                .and_then(Value::as_f64)
                .ok_or_else(|| AtlasError::invalid("geometry", "missing longitude"))?;
            let lat = arr
                .get(1)
                .and_then(Value::as_f64)
                .ok_or_else(|| AtlasError::invalid("geometry", "missing latitude"))?;
            Ok(LonLat { lon, lat })
        })
        .collect()
}

/// Parse a GeoJSON `Feature` or bare `Geometry` of type `Polygon` or
/// `MultiPolygon`.
pub fn parse_geojson(value: &Value) -> Result<Polygon, AtlasError> {
    let geometry = if value.get("type").and_then(Value::as_str) == Some("Feature") {
        value
            .get("geometry")
            .ok_or_else(|| AtlasError::invalid("geometry", "Feature missing geometry"))?
    } else {
        value
    };

    let geom_type = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AtlasError::invalid("geometry", "missing geometry type"))?;

    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| AtlasError::invalid("geometry", "missing coordinates"))?;

    match geom_type {
        "Polygon" => {
            let rings_raw = coordinates.as_array().ok_or_else(|| {
                AtlasError::invalid("geometry", "Polygon coordinates must be an array of rings")
            })?;
            let rings = rings_raw
                .iter()
                .map(parse_ring)
                .collect::<Result<Vec<_>, _>>()?;
            if rings.is_empty() {
                return Err(AtlasError::invalid("geometry", "Polygon has no rings"));
            }
            Ok(Polygon { rings })
        }
        "MultiPolygon" => {
            let polys_raw = coordinates.as_array().ok_or_else(|| {
                AtlasError::invalid(
                    "geometry",
                    "MultiPolygon coordinates must be an array of polygons",
                )
            })?;
            let mut rings = Vec::new();
            for poly in polys_raw {
                let poly_rings = poly.as_array().ok_or_else(|| {
                    AtlasError::invalid("geometry", "malformed MultiPolygon entry")
                })?;
                if let Some(exterior) = poly_rings.first() {
                    rings.push(parse_ring(exterior)?);
                }
            }
            if rings.is_empty() {
                return Err(AtlasError::invalid("geometry", "MultiPolygon has no polygons"));
            }
            Ok(Polygon { rings })
        }
        other => Err(AtlasError::invalid(
            "geometry",
            format!("unsupported geometry type '{other}' — expected Polygon or MultiPolygon"),
        )),
    }
}

fn mean_lat(ring: &[LonLat]) -> f64 {
    ring.iter().map(|p| p.lat).sum::<f64>() / ring.len() as f64
}

/// Shoelace area of a single ring, projected to km via `lat_to_km = 111.0`
/// and `lon_to_km = 111.0 * cos(mean_lat)`.
fn ring_area_km2(ring: &[LonLat]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let lat0 = mean_lat(ring);
    let lon_to_km = LAT_TO_KM * lat0.to_radians().cos();

    let mut sum = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        let xi = ring[i].lon * lon_to_km;
        let yi = ring[i].lat * LAT_TO_KM;
        let xj = ring[j].lon * lon_to_km;
        let yj = ring[j].lat * LAT_TO_KM;
        sum += xi * yj - xj * yi;
    }
    (sum / 2.0).abs()
}

/// Geodesic area in km², exterior ring minus any holes.
pub fn area_km2(polygon: &Polygon) -> f64 {
    let mut area = 0.0;
    for (i, ring) in polygon.rings.iter().enumerate() {
        let ring_area = ring_area_km2(ring);
        if i == 0 {
            area += ring_area;
        } else {
            area -= ring_area;
        }
    }
    area.max(0.0)
}

/// Coordinate-mean centroid of the exterior ring (the fallback path named
/// in spec.md §4.6 — no equal-area projection library is available).
pub fn centroid(polygon: &Polygon) -> LonLat {
    let exterior = &polygon.rings[0];
    let n = exterior.len() as f64;
    let lon = exterior.iter().map(|p| p.lon).sum::<f64>() / n;
    let lat = exterior.iter().map(|p| p.lat).sum::<f64>() / n;
    LonLat { lon, lat }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskType {
    Flood,
    Coastal,
    Heat,
    Drought,
    Agriculture,
}

fn base_exposure_for(risk_type: RiskType) -> f64 {
    match risk_type {
        RiskType::Flood => 0.45,
        RiskType::Coastal => 0.35,
        RiskType::Heat => 0.60,
        RiskType::Drought => 0.40,
        RiskType::Agriculture => 0.50,
    }
}

/// Scenario-intensity driver feeding the exposure's intensity factor, one
/// of the three named in spec.md §4.6 (whichever applies to `risk_type`).
#[derive(Debug, Clone, Copy)]
pub enum IntensityDriver {
    FloodDepthM(f64),
    SlrM(f64),
    TempDeltaC(f64),
}

fn intensity_factor(driver: IntensityDriver) -> f64 {
    match driver {
        IntensityDriver::FloodDepthM(depth) => (depth * 0.15).min(0.3),
        IntensityDriver::SlrM(slr) => (slr * 0.20).min(0.3),
        IntensityDriver::TempDeltaC(delta) => (delta * 0.10).min(0.25),
    }
}

/// Deterministic fractional exposure in `[0.05, 0.95]` (P7), reproducing
/// `original_source/spatial_engine.py`'s `simulate_fractional_exposure`.
pub fn fractional_exposure(
    centroid: LonLat,
    area_km2: f64,
    risk_type: RiskType,
    intensity: IntensityDriver,
) -> f64 {
    let seed = location_seed(centroid.lat, centroid.lon);
    let base = base_exposure_for(risk_type);
    let location_factor = (seed as f64 / 100.0) * 0.4 - 0.2;
    let intensity_term = intensity_factor(intensity);
    let size_factor = (area_km2 / 100.0).min(0.1) * ((seed % 10) as f64 / 10.0 - 0.5);

    (base + location_factor + intensity_term + size_factor).clamp(0.05, 0.95)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialScaling {
    pub area_km2: f64,
    pub exposure_fraction: f64,
    pub exposed_value_usd: f64,
    pub value_at_risk_usd: f64,
    pub protected_value_usd: f64,
}

/// Monetary scaling: `exposed_value = asset_value * exposure`,
/// `value_at_risk = exposed_value * damage_factor`,
/// `protected_value = asset_value - exposed_value`.
pub fn scale_monetary_risk(
    asset_value_usd: f64,
    exposure_fraction: f64,
    damage_factor: f64,
    area_km2: f64,
) -> SpatialScaling {
    let exposed_value_usd = asset_value_usd * exposure_fraction;
    let value_at_risk_usd = (exposed_value_usd * damage_factor).min(asset_value_usd);
    SpatialScaling {
        area_km2,
        exposure_fraction,
        exposed_value_usd,
        value_at_risk_usd,
        protected_value_usd: asset_value_usd - exposed_value_usd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn r3_square_degree_area_near_equator() {
        // spec §8 R3: 0.01deg x 0.01deg square at the equator ~ 1.23 km^2.
        let geojson = json!({
            "type": "Polygon",
            "coordinates": [[
                [0.0, 0.0], [0.01, 0.0], [0.01, 0.01], [0.0, 0.01], [0.0, 0.0]
            ]]
        });
        let polygon = parse_geojson(&geojson).unwrap();
        let area = area_km2(&polygon);
        assert!((area - 1.23).abs() / 1.23 < 0.02, "area was {area}");
    }

    #[test]
    fn parses_feature_wrapper() {
        let geojson = json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]
            },
            "properties": {}
        });
        let polygon = parse_geojson(&geojson).unwrap();
        assert_eq!(polygon.rings.len(), 1);
    }

    #[test]
    fn multipolygon_keeps_each_exterior_ring() {
        let geojson = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]],
                [[[2.0,2.0],[3.0,2.0],[3.0,3.0],[2.0,3.0],[2.0,2.0]]]
            ]
        });
        let polygon = parse_geojson(&geojson).unwrap();
        assert_eq!(polygon.rings.len(), 2);
    }

    #[test]
    fn rejects_unsupported_geometry_type() {
        let geojson = json!({"type": "Point", "coordinates": [0.0, 0.0]});
        assert!(parse_geojson(&geojson).is_err());
    }

    #[test]
    fn p7_exposure_always_in_bounds() {
        for lat in [-80.0, -10.0, 0.0, 35.0, 80.0] {
            for lon in [-170.0, -10.0, 0.0, 100.0] {
                for risk in [
                    RiskType::Flood,
                    RiskType::Coastal,
                    RiskType::Heat,
                    RiskType::Drought,
                    RiskType::Agriculture,
                ] {
                    let exposure = fractional_exposure(
                        LonLat { lon, lat },
                        50.0,
                        risk,
                        IntensityDriver::TempDeltaC(2.0),
                    );
                    assert!((0.05..=0.95).contains(&exposure), "exposure out of bounds: {exposure}");
                }
            }
        }
    }

    #[test]
    fn p7_value_at_risk_never_exceeds_asset_value() {
        let scaling = scale_monetary_risk(1_000_000.0, 0.9, 1.5, 10.0);
        assert!(scaling.value_at_risk_usd <= 1_000_000.0);
        assert!(scaling.protected_value_usd >= 0.0);
    }

    #[test]
    fn same_inputs_give_same_exposure() {
        let a = fractional_exposure(
            LonLat { lon: 10.0, lat: 20.0 },
            30.0,
            RiskType::Flood,
            IntensityDriver::FloodDepthM(1.0),
        );
        let b = fractional_exposure(
            LonLat { lon: 10.0, lat: 20.0 },
            30.0,
            RiskType::Flood,
            IntensityDriver::FloodDepthM(1.0),
        );
        assert_eq!(a, b);
    }
}
