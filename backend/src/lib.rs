//! Backend of the ad-report dashboard's import & mapping engine.
//!
//! The pieces, leaf first: [`file_store`] keeps uploaded files alive for a
//! few minutes, [`parser`] turns them into columns and rows,
//! [`mappings_store`] persists external-value -> ad-copy associations,
//! [`import`] drives the five-step workflow and the final join, and
//! [`services`] exposes the HTTP surface.

pub mod config;
pub mod error;
pub mod file_store;
pub mod import;
pub mod mappings_store;
pub mod parser;
pub mod services;
