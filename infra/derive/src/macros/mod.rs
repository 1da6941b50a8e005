pub mod error;
pub mod feature;
