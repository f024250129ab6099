pub mod feature;
pub mod measure;

pub use feature::{display_center, feature_bbox, parcel_feature, parcel_feature_collection};
pub use measure::measurement_labels;
