use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::domain::parcel::ParcelGeometry;
use crate::errors::ServerError;

/// Build the /parcelData/geo feature for one parcel: stored geometry plus
/// parcel_no and the explicit display coordinates when the registry has
/// them.
pub fn parcel_feature(parcel: &ParcelGeometry) -> Result<Feature, ServerError> {
    let geometry = parse_geometry(parcel.geometry.as_deref())?;

    let mut properties = JsonObject::new();
    properties.insert("parcel_no".into(), json!(parcel.parcel_no));
    if let Some(lon) = parcel.longitude {
        properties.insert("longitude".into(), json!(lon));
    }
    if let Some(lat) = parcel.latitude {
        properties.insert("latitude".into(), json!(lat));
    }

    Ok(Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// The public-map FeatureCollection. Feature properties carry only the
/// parcel number; rows with unparseable geometry are skipped rather than
/// failing the whole collection.
pub fn parcel_feature_collection(parcels: &[ParcelGeometry]) -> FeatureCollection {
    let features = parcels
        .iter()
        .filter_map(|p| {
            let geometry = parse_geometry(p.geometry.as_deref()).ok()??;

            let mut properties = JsonObject::new();
            properties.insert("parcel_no".into(), json!(p.parcel_no));

            Some(Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn parse_geometry(raw: Option<&str>) -> Result<Option<Geometry>, ServerError> {
    let Some(raw) = raw else { return Ok(None) };
    let geometry: Geometry = serde_json::from_str(raw)
        .map_err(|e| ServerError::DbError(format!("stored geometry is not GeoJSON: {e}")))?;
    Ok(Some(geometry))
}

/// Display center for a parcel feature:
/// 1. explicit longitude/latitude properties win;
/// 2. else the first vertex of the first polygon ring;
/// 3. else a Point geometry's own coordinates.
/// The geometry is trusted as delivered; no winding or closure checks.
pub fn display_center(feature: &Feature) -> Option<[f64; 2]> {
    if let Some(props) = &feature.properties {
        let lon = props.get("longitude").and_then(|v| v.as_f64());
        let lat = props.get("latitude").and_then(|v| v.as_f64());
        if let (Some(lon), Some(lat)) = (lon, lat) {
            return Some([lon, lat]);
        }
    }

    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) => first_vertex(rings),
        Some(Value::MultiPolygon(polys)) => polys.first().and_then(|rings| first_vertex(rings)),
        Some(Value::Point(coords)) if coords.len() >= 2 => Some([coords[0], coords[1]]),
        _ => None,
    }
}

fn first_vertex(rings: &[Vec<Vec<f64>>]) -> Option<[f64; 2]> {
    let vertex = rings.first()?.first()?;
    if vertex.len() >= 2 {
        Some([vertex[0], vertex[1]])
    } else {
        None
    }
}

/// Bounding box `[min_lon, min_lat, max_lon, max_lat]` over every vertex
/// of the feature's geometry, for fit-bounds on the map. None when the
/// geometry is missing or carries no coordinates.
pub fn feature_bbox(feature: &Feature) -> Option<[f64; 4]> {
    let mut bbox: Option<[f64; 4]> = None;

    let mut fold = |lon: f64, lat: f64| {
        bbox = Some(match bbox {
            None => [lon, lat, lon, lat],
            Some([min_lon, min_lat, max_lon, max_lat]) => [
                min_lon.min(lon),
                min_lat.min(lat),
                max_lon.max(lon),
                max_lat.max(lat),
            ],
        });
    };

    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(c)) if c.len() >= 2 => fold(c[0], c[1]),
        Some(Value::Polygon(rings)) => fold_rings(rings, &mut fold),
        Some(Value::MultiPolygon(polys)) => {
            for rings in polys {
                fold_rings(rings, &mut fold);
            }
        }
        _ => {}
    }

    bbox
}

fn fold_rings(rings: &[Vec<Vec<f64>>], fold: &mut impl FnMut(f64, f64)) {
    for ring in rings {
        for vertex in ring {
            if vertex.len() >= 2 {
                fold(vertex[0], vertex[1]);
            }
        }
    }
}
