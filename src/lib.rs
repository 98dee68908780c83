pub mod brightness;
pub mod close_approach;
pub mod constants;
pub mod conversion;
pub mod ephemeris;
pub mod ephemerix_errors;
pub mod formatters;
pub mod parallax;
pub mod providers;
mod ref_system;
pub mod shadow;
pub mod step_size;
pub mod time;
pub mod uncertainty;

pub use ref_system::{ecliptic_to_equatorial, equatorial_to_ecliptic, vector_to_ra_dec};
