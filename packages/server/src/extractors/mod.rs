pub mod api_base;
pub mod device;
pub mod json;
