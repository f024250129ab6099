use geo::{Centroid, GeodesicArea, HaversineDistance};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

/// Measurement overlay for a parcel feature: one area label at each
/// polygon's centroid plus a length label at the midpoint of every edge.
/// A closed N-vertex ring (first == last) yields exactly
/// 1 + (N - 1) labels.
pub fn measurement_labels(feature: &Feature) -> FeatureCollection {
    let mut labels = Vec::new();

    if let Some(geometry) = &feature.geometry {
        match &geometry.value {
            Value::Polygon(rings) => push_polygon_labels(rings, &mut labels),
            Value::MultiPolygon(polys) => {
                for rings in polys {
                    push_polygon_labels(rings, &mut labels);
                }
            }
            _ => {}
        }
    }

    FeatureCollection {
        bbox: None,
        features: labels,
        foreign_members: None,
    }
}

fn push_polygon_labels(rings: &[Vec<Vec<f64>>], labels: &mut Vec<Feature>) {
    let Some(ring) = rings.first() else { return };
    if ring.len() < 2 {
        return;
    }

    // Area label at the centroid.
    let exterior: geo::LineString<f64> = ring
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| geo::Coord { x: c[0], y: c[1] })
        .collect();
    let polygon = geo::Polygon::new(exterior, vec![]);
    let area_m2 = polygon.geodesic_area_unsigned();

    if let Some(centroid) = polygon.centroid() {
        labels.push(label_feature(
            [centroid.x(), centroid.y()],
            format!("{:.1} m²", area_m2),
        ));
    }

    // One length label per edge, at the edge midpoint.
    for pair in ring.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.len() < 2 || b.len() < 2 {
            continue;
        }
        let len_m = geo::Point::new(a[0], a[1]).haversine_distance(&geo::Point::new(b[0], b[1]));
        let mid = [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0];
        labels.push(label_feature(mid, format!("{:.1} m", len_m)));
    }
}

fn label_feature(at: [f64; 2], label: String) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("label".into(), json!(label));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![at[0], at[1]]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
