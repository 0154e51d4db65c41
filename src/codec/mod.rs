pub mod front_matter;
pub mod transport;

pub use front_matter::{decode, encode};
