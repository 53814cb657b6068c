pub mod mappings;
pub mod uploads;
