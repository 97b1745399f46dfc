pub mod data;
pub mod license_key;
pub mod odds;
