pub mod config;
pub mod consent;
pub mod google;
pub mod storage;
