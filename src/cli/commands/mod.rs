//! Command implementations

pub mod anonymize;
pub mod deanonymize;
pub mod inspect;
pub mod validate;
