pub mod observation;
pub mod point;
pub mod query_range;
pub mod station;
