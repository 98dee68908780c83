//! # External collaborator seams
//!
//! The stepping kernel is deterministic and self-contained; everything that
//! involves dynamics integration, planetary ephemerides, orbital-element
//! conversion or MOID computation is injected through the traits below.
//!
//! A caller assembling a full ephemeris run implements (or adapts) these for
//! its own integrator and ephemeris source:
//!
//! - [`OrbitPropagator`] — advances an orbit state in place between epochs.
//!   The stepper guarantees monotone, contiguous epochs per realization.
//! - [`ObserverLocator`] — heliocentric ecliptic state of an observing site
//!   (or body center, via a zero-parallax frame), plus an optional
//!   Earth/Moon pair for the lunar columns.
//! - [`ElementsWriter`] — renders the orbital-elements text block the
//!   elements output modes splice into the stream.
//! - [`MoidProvider`] — minimum orbit intersection distance against a
//!   reference planet.
//! - [`PhaseFunction`] — the magnitude phase/distance term. Default
//!   implementations live in [`crate::brightness`].

use nalgebra::Vector3;

use crate::constants::{BodyIndex, Radian, MJD};
use crate::ephemeris::{ObserverFrame, OrbitState};
use crate::ephemerix_errors::EphemerixError;

/// In-place orbit propagation between two epochs (MJD TT).
pub trait OrbitPropagator {
    /// Advance `state` from `from` to `to`. The stepper never asks a
    /// realization to jump over an epoch it has not reached.
    fn propagate(&self, state: &mut OrbitState, from: MJD, to: MJD) -> Result<(), EphemerixError>;
}

/// Observer/site state supplier, in heliocentric ecliptic J2000 coordinates.
pub trait ObserverLocator {
    /// Heliocentric ecliptic position of the site at `epoch` (MJD TT), in AU.
    fn observer_position(
        &self,
        epoch: MJD,
        frame: &ObserverFrame,
    ) -> Result<Vector3<f64>, EphemerixError>;

    /// Heliocentric ecliptic velocity of the site at `epoch`, in AU/day.
    fn observer_velocity(
        &self,
        epoch: MJD,
        frame: &ObserverFrame,
    ) -> Result<Vector3<f64>, EphemerixError>;

    /// Heliocentric ecliptic positions of the Earth's center and the Moon.
    ///
    /// `None` silently disables the lunar elongation column, the moon
    /// visibility codes and the shadow test, matching the policy for
    /// missing optional data.
    fn earth_and_moon(&self, _epoch: MJD) -> Option<(Vector3<f64>, Vector3<f64>)> {
        None
    }
}

/// Style of the orbital-elements snapshot output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementsStyle {
    /// Classic 8-line elements block.
    EightLine,
    /// One-line MPCORB-format record.
    Mpcorb,
}

/// Renders an orbital-elements text block for the elements output modes.
pub trait ElementsWriter {
    /// Produce the block for `state` at `epoch`; `with_comments` is set only
    /// on the final step of a run.
    fn elements_block(
        &mut self,
        state: &OrbitState,
        epoch: MJD,
        style: ElementsStyle,
        with_comments: bool,
    ) -> Result<String, EphemerixError>;
}

/// Minimum orbit intersection distance supplier.
pub trait MoidProvider {
    /// MOID (AU) between the osculating orbit of `state` at `epoch` and the
    /// reference planet `planet` (1 = Mercury … 8 = Neptune).
    fn moid(&self, state: &OrbitState, epoch: MJD, planet: BodyIndex)
        -> Result<f64, EphemerixError>;
}

/// Magnitude phase/distance term.
pub trait PhaseFunction {
    /// Returns `(delta_mag, phase_angle)` for heliocentric distance
    /// `solar_r`, observer distance `delta` and observer heliocentric
    /// distance `earth_r` (all AU).
    fn phase_and_distance(&self, solar_r: f64, delta: f64, earth_r: f64) -> (f64, Radian);
}
