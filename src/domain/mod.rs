pub mod firm_property;
pub mod listing;
pub mod note;
pub mod parcel;
pub mod user;
