pub mod quiz;
pub mod store;
