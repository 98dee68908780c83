//! # Ephemeris stepping and output assembly
//!
//! The orchestrator of the crate: a single-pass state machine over the
//! requested epochs. Each step propagates every orbit realization from its
//! own previous epoch (never jumping over one), derives observer-relative
//! geometry, and dispatches to one of five output modes: full observables,
//! state vectors, positions, a close-approach log, or orbital-element
//! snapshots spliced from a collaborator.
//!
//! All run-scoped knobs live in [`RunConfig`] and [`EphemerisOptions`] and
//! are threaded explicitly; nothing reads ambient process state. The output
//! stream is any [`io::Write`], with [`ephemeris_to_file`] as the file
//! convenience wrapper.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use nalgebra::Vector3;
use ordered_float::NotNan;

use crate::brightness::RadarProfile;
use crate::close_approach::CloseApproachDetector;
use crate::constants::{planet_radius_au, BodyIndex, Meter, Radian, MJD, RAD2ARC, VLIGHT_AU};
use crate::ephemerix_errors::EphemerixError;
use crate::parallax::{lat_alt_to_parallax, parallax_to_lat_alt};
use crate::providers::{
    ElementsStyle, ElementsWriter, MoidProvider, ObserverLocator, OrbitPropagator, PhaseFunction,
};
use crate::ref_system::{ecliptic_to_equatorial, equatorial_to_ecliptic};
use crate::step_size::{StepSize, StepUnit};
use crate::time::{format_ephem_date, tt_to_utc_mjd, utc_to_tt_mjd};
use crate::uncertainty::{uncertainty_ellipse, SkyPosition};

mod observables;

use observables::{observables_line, ObservablesCtx};

/// Heliocentric orbital state in ecliptic J2000 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Position, AU.
    pub position: Vector3<f64>,
    /// Velocity, AU/day.
    pub velocity: Vector3<f64>,
}

/// Role of a realization within a run.
///
/// The primary realization drives magnitude, visibility and every output
/// line; uncertainty samples contribute only sky positions to the ellipse
/// fit. The role is carried explicitly rather than inferred from position
/// in the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealizationRole {
    Primary,
    UncertaintySample,
}

/// One candidate orbit solution stepped through the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitRealization {
    pub state: OrbitState,
    pub role: RealizationRole,
}

impl OrbitRealization {
    pub fn primary(state: OrbitState) -> Self {
        OrbitRealization {
            state,
            role: RealizationRole::Primary,
        }
    }

    pub fn sample(state: OrbitState) -> Self {
        OrbitRealization {
            state,
            role: RealizationRole::UncertaintySample,
        }
    }
}

/// Immutable observing-site description for a run.
///
/// Parallax constants are stored in AU so they can be added directly to
/// body-centered positions; a frame with both constants zero denotes the
/// body center itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverFrame {
    /// Body the site is fixed to (3 = Earth).
    pub body: BodyIndex,
    /// ρ·cos φ', AU.
    pub rho_cos_phi: NotNan<f64>,
    /// ρ·sin φ', AU.
    pub rho_sin_phi: NotNan<f64>,
    /// East longitude, radians.
    pub longitude: Radian,
}

impl ObserverFrame {
    /// The body center itself (geocenter for Earth).
    pub fn geocentric(body: BodyIndex) -> Self {
        ObserverFrame {
            body,
            rho_cos_phi: NotNan::new(0.).expect("zero is not NaN"),
            rho_sin_phi: NotNan::new(0.).expect("zero is not NaN"),
            longitude: 0.,
        }
    }

    /// Build a frame from parallax constants already expressed in AU.
    pub fn from_parallax(
        body: BodyIndex,
        rho_cos_phi: f64,
        rho_sin_phi: f64,
        longitude: Radian,
    ) -> Result<Self, EphemerixError> {
        let wrap = |v: f64| {
            NotNan::new(v)
                .map_err(|_| EphemerixError::ObserverState("NaN parallax constant".to_string()))
        };
        Ok(ObserverFrame {
            body,
            rho_cos_phi: wrap(rho_cos_phi)?,
            rho_sin_phi: wrap(rho_sin_phi)?,
            longitude,
        })
    }

    /// Build a frame from planetodetic latitude and altitude.
    pub fn from_geodetic(
        body: BodyIndex,
        latitude: Radian,
        altitude: Meter,
        longitude: Radian,
    ) -> Result<Self, EphemerixError> {
        let (rho_cos_phi, rho_sin_phi) = lat_alt_to_parallax(latitude, altitude, body);
        Self::from_parallax(body, rho_cos_phi, rho_sin_phi, longitude)
    }

    /// A frame with nonzero parallax constants is an actual surface site.
    pub fn is_topocentric(&self) -> bool {
        *self.rho_cos_phi != 0. || *self.rho_sin_phi != 0.
    }

    /// Planetodetic latitude and altitude recovered from the constants.
    pub fn geodetic(&self) -> (Radian, Meter) {
        let radius = planet_radius_au(self.body);
        parallax_to_lat_alt(
            *self.rho_cos_phi / radius,
            *self.rho_sin_phi / radius,
            self.body,
        )
    }
}

/// Output mode of a run; modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EphemMode {
    /// Full fixed-column observables lines.
    Observables,
    /// Position and velocity vectors.
    StateVectors,
    /// Position vectors only.
    Positions,
    /// One line per detected close approach.
    CloseApproaches,
    /// Orbital-element snapshots from the elements collaborator.
    Elements { style: ElementsStyle },
}

/// Optional-column selection for the observables mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EphemerisOptions {
    pub alt_az: bool,
    pub radial_velocity: bool,
    pub space_velocity: bool,
    pub phase_angle: bool,
    pub phase_angle_bisector: bool,
    pub helio_ecliptic: bool,
    pub topo_ecliptic: bool,
    pub lunar_elongation: bool,
    pub motion: bool,
    /// With `motion`: separate RA/Dec rates instead of total + position angle.
    pub separate_motions: bool,
    pub moids: bool,
    pub ground_track: bool,
    /// Uncertainty columns; needs more than one realization.
    pub uncertainties: bool,
    pub visibility: bool,
    pub suppress_unobservable: bool,
    pub computer_friendly: bool,
    pub round_to_nearest_step: bool,
}

/// Scaling options for the vector output modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorOptions {
    /// Rotate output vectors to ecliptic J2000 (default equatorial).
    pub ecliptic: bool,
    /// Position unit in AU (e.g. the AU-to-km factor for km output).
    pub position_mult: f64,
    /// Time unit in days (e.g. 1/86400 for per-second velocities).
    pub time_mult: f64,
}

impl Default for VectorOptions {
    fn default() -> Self {
        VectorOptions {
            ecliptic: false,
            position_mult: 1.,
            time_mult: 1.,
        }
    }
}

/// Run-scoped configuration, threaded explicitly into every run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Observables lines fainter than this are suppressed.
    pub mag_limit: f64,
    /// Keep the delta column in AU regardless of magnitude (radar users
    /// prefer no unit switching); also implied by a radar profile.
    pub au_only_distances: bool,
    /// Output epochs in TT instead of UTC (vector and elements modes are
    /// always TT).
    pub tt_output: bool,
    /// Absolute magnitude H; `None` disables the magnitude and SNR columns.
    pub abs_mag: Option<f64>,
    /// Switches the doubtful-magnitude marker off at large phase angles.
    pub is_comet: bool,
    /// Radar station profile; `None` disables the SNR column.
    pub radar: Option<RadarProfile>,
    /// Observation-plane offsets added to every computed RA/Dec, arcseconds.
    pub ra_offset_arcsec: f64,
    pub dec_offset_arcsec: f64,
    pub vector_options: VectorOptions,
    /// Free-form annotation echoed as a `#` line above the observables
    /// header; the other modes ignore it.
    pub note: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            mag_limit: 22.,
            au_only_distances: false,
            tt_output: false,
            abs_mag: None,
            is_comet: false,
            radar: None,
            ra_offset_arcsec: 0.,
            dec_offset_arcsec: 0.,
            vector_options: VectorOptions::default(),
            note: None,
        }
    }
}

/// Everything that defines one ephemeris run.
#[derive(Debug, Clone)]
pub struct EphemerisRequest {
    pub frame: ObserverFrame,
    /// First output epoch, MJD in the run's output timescale.
    pub start: MJD,
    pub step: StepSize,
    pub n_steps: usize,
    pub mode: EphemMode,
    pub options: EphemerisOptions,
    pub config: RunConfig,
}

/// External collaborators wired into a run.
pub struct Collaborators<'a> {
    pub propagator: &'a dyn OrbitPropagator,
    pub locator: &'a dyn ObserverLocator,
    pub elements: Option<&'a mut dyn ElementsWriter>,
    pub moids: Option<&'a dyn MoidProvider>,
    pub phase: &'a dyn PhaseFunction,
}

/// Per-realization state carried from step to step.
struct StepHistory {
    prev_epoch: MJD,
    detector: CloseApproachDetector,
}

/// Per-step observer-relative geometry of one realization.
pub(crate) struct StepGeometry {
    /// Topocentric vector, ecliptic, light-lagged in observables mode.
    pub topo_ecl: Vector3<f64>,
    /// Topocentric vector, equatorial.
    pub topo_equ: Vector3<f64>,
    /// Geocentric (body-centric) vector, equatorial.
    pub geo_equ: Vector3<f64>,
    /// Topocentric velocity, equatorial (not light-lagged).
    pub topo_vel_equ: Vector3<f64>,
    /// Heliocentric position after the light-time lag, ecliptic.
    pub helio_lagged: Vector3<f64>,
    /// Topocentric range, AU.
    pub r: f64,
    /// Heliocentric range after lag, AU.
    pub solar_r: f64,
    /// Radial velocity, AU/day.
    pub radial_vel: f64,
}

fn step_geometry(
    state: &OrbitState,
    obs_posn: &Vector3<f64>,
    geo_posn: &Vector3<f64>,
    obs_vel: &Vector3<f64>,
    light_lag: bool,
) -> StepGeometry {
    let mut topo = state.position - obs_posn;
    let mut geo = state.position - geo_posn;
    let topo_vel = state.velocity - obs_vel;
    let mut helio = state.position;

    // single Newton-style light-time correction, not iterated
    if light_lag {
        let lag = topo.norm() / VLIGHT_AU;
        let diff = -state.velocity * lag;
        helio += diff;
        topo += diff;
        geo += diff;
    }

    let topo_equ = ecliptic_to_equatorial(&topo);
    let geo_equ = ecliptic_to_equatorial(&geo);
    let topo_vel_equ = ecliptic_to_equatorial(&topo_vel);
    let v_dot_r = topo_equ.dot(&topo_vel_equ);
    let r = topo_equ.norm();
    StepGeometry {
        topo_ecl: topo,
        topo_equ,
        geo_equ,
        topo_vel_equ,
        helio_lagged: helio,
        r,
        solar_r: helio.norm(),
        radial_vel: v_dot_r / r,
    }
}

/// Decimal places for a 16-character vector column at the given unit scale.
fn vector_digits(mult: f64, start: i32) -> usize {
    let mut digits = start;
    let mut t = mult;
    while t > 1.2 {
        t /= 10.;
        digits -= 1;
    }
    digits.max(0) as usize
}

fn vector_line(curr: MJD, g: &StepGeometry, with_velocity: bool, vopts: &VectorOptions) -> String {
    let (mut posn, mut vel) = (g.topo_equ, g.topo_vel_equ);
    if vopts.ecliptic {
        posn = equatorial_to_ecliptic(&posn);
        vel = equatorial_to_ecliptic(&vel);
    }
    let vel_mult = vopts.position_mult / vopts.time_mult;

    let mut line = format!("{curr:.5}");
    let digits = vector_digits(vopts.position_mult, 10);
    for component in posn.iter() {
        line.push_str(&format!("{:16.digits$}", component * vopts.position_mult));
    }
    if with_velocity {
        line.push(' ');
        let digits = vector_digits(vel_mult, 12);
        for component in vel.iter() {
            line.push_str(&format!("{:16.digits$}", component * vel_mult));
        }
    }
    line
}

/// Column titles then a dashed underline for the observables header.
fn write_observables_header<W: Write>(
    out: &mut W,
    request: &EphemerisRequest,
    show_visibility: bool,
    show_alt_az: bool,
    show_uncertainties: bool,
    show_radar: bool,
) -> io::Result<()> {
    let options = &request.options;
    let config = &request.config;

    let mut hr_min = match request.step.unit {
        StepUnit::Days | StepUnit::Weeks | StepUnit::Years => "",
        StepUnit::Hours => " HH",
        StepUnit::Minutes => " HH:MM",
        StepUnit::Seconds => " HH:MM:SS",
    }
    .to_string();
    if request.step.digits > 0 {
        hr_min.push('.');
        for _ in 0..request.step.digits {
            hr_min.push(request.step.unit.as_char());
        }
    }

    if let (Some(radar), Some(h)) = (&config.radar, config.abs_mag) {
        if show_radar {
            writeln!(
                out,
                "Assumes power={:.2} kW, Tsys={:.1} deg K, gain {:.2} K/Jy",
                radar.power_w / 1000.,
                radar.system_temp_k,
                radar.gain
            )?;
            writeln!(
                out,
                "Assumed rotation period = {:.2} hours, diameter {:.1} meters",
                crate::brightness::rotation_period_hours(h),
                crate::brightness::diameter_from_abs_mag(h, crate::brightness::OPTICAL_ALBEDO)
            )?;
        }
    }

    let timescale = if config.tt_output { "(TT)" } else { "(UTC)" };
    write!(out, "Date {timescale}{hr_min}   RA              ")?;
    write!(out, "Dec         delta   r     elong ")?;
    if show_visibility {
        write!(out, "SM ")?;
    }
    if options.phase_angle {
        write!(out, " ph_ang  ")?;
    }
    if options.phase_angle_bisector {
        write!(out, " ph_ang_bisector  ")?;
    }
    if options.helio_ecliptic {
        write!(out, " helio ecliptic   ")?;
    }
    if options.topo_ecliptic {
        write!(out, " topo ecliptic    ")?;
    }
    if config.abs_mag.is_some() {
        write!(out, " mag")?;
    }
    if options.lunar_elongation {
        write!(out, "  LuElo")?;
    }
    if options.motion {
        write!(
            out,
            "{}",
            if options.separate_motions {
                "  RA '/hr dec "
            } else {
                "  '/hr    PA  "
            }
        )?;
    }
    if show_alt_az {
        write!(out, " alt  az")?;
    }
    if options.radial_velocity {
        write!(out, "  rvel ")?;
    }
    if show_radar {
        write!(out, "  SNR")?;
    }
    if options.ground_track {
        write!(out, "  lon      lat      alt (km) ")?;
    }
    if options.space_velocity {
        write!(out, "  svel ")?;
    }
    if show_uncertainties {
        write!(out, " \" sig PA")?;
    }
    writeln!(out)?;

    let dashed: String = hr_min
        .chars()
        .map(|c| if c == ' ' { ' ' } else { '-' })
        .collect();
    write!(out, "---- -- --{dashed}  ------------   ")?;
    write!(out, "------------  ------ ------ ----- ")?;
    if show_visibility {
        write!(out, "-- ")?;
    }
    if options.phase_angle {
        write!(out, " ------  ")?;
    }
    if options.phase_angle_bisector {
        write!(out, " ---------------  ")?;
    }
    if options.helio_ecliptic {
        write!(out, " ---------------  ")?;
    }
    if options.topo_ecliptic {
        write!(out, " ---------------  ")?;
    }
    if config.abs_mag.is_some() {
        write!(out, " ---")?;
    }
    if options.lunar_elongation {
        write!(out, "  -----")?;
    }
    if options.motion {
        write!(out, " ------ ------")?;
    }
    if show_alt_az {
        write!(out, " --- ---")?;
    }
    if options.radial_velocity {
        write!(out, "  -----")?;
    }
    if show_radar {
        write!(out, " ----")?;
    }
    if options.ground_track {
        write!(out, " -------- -------- ----------")?;
    }
    if options.space_velocity {
        write!(out, "  -----")?;
    }
    if show_uncertainties {
        write!(out, " ---- ---")?;
    }
    writeln!(out)
}

/// Uncertainty cell: arcsecond ladder plus an integer position angle.
fn uncertainty_cell(major_axis: Radian, position_angle: Radian, computer_friendly: bool) -> String {
    let dist = major_axis * RAD2ARC;
    let dist_in_arcsec = dist as u64;
    let pa_deg = position_angle.to_degrees();
    let integer_posn_ang = ((-pa_deg + 0.5).floor() as i64).rem_euclid(180);

    let tbuff = if computer_friendly {
        format!("{dist_in_arcsec:6}")
    } else if dist_in_arcsec < 9 {
        format!("{dist:4.1}")
    } else if dist_in_arcsec < 10_000 {
        format!("{dist_in_arcsec:4}")
    } else if dist_in_arcsec < 60_000 {
        format!("{:3}'", dist_in_arcsec / 60)
    } else {
        format!("{:3}d", dist_in_arcsec / 3600)
    };
    format!(" {tbuff} {integer_posn_ang:3}")
}

fn validate(
    realizations: &[OrbitRealization],
    request: &EphemerisRequest,
) -> Result<(), EphemerixError> {
    if request.step.days == 0. {
        return Err(EphemerixError::InvalidStepSize("0".to_string()));
    }
    let primaries = realizations
        .iter()
        .filter(|r| r.role == RealizationRole::Primary)
        .count();
    if realizations.is_empty() || primaries != 1 || realizations[0].role != RealizationRole::Primary
    {
        return Err(EphemerixError::Config(
            "exactly one primary realization, listed first".to_string(),
        ));
    }
    let vopts = &request.config.vector_options;
    if vopts.position_mult == 0. || vopts.time_mult == 0. {
        return Err(EphemerixError::Config(
            "vector position/time multipliers must be nonzero".to_string(),
        ));
    }
    Ok(())
}

/// Run one ephemeris and write it to `out`.
///
/// `states_epoch` is the TT epoch the realization states are referenced to;
/// each realization is propagated from its own previous epoch at every step.
/// Configuration errors abort before any output; numeric edge cases mid-run
/// are absorbed by the formatters and never abort.
pub fn generate_ephemeris<W: Write>(
    out: &mut W,
    realizations: &mut [OrbitRealization],
    states_epoch: MJD,
    request: &EphemerisRequest,
    collab: &mut Collaborators<'_>,
) -> Result<(), EphemerixError> {
    validate(realizations, request)?;

    let options = &request.options;
    let config = &request.config;
    let frame = &request.frame;

    let show_topocentric = frame.is_topocentric() && request.mode == EphemMode::Observables;
    let show_alt_az = options.alt_az && show_topocentric;
    let show_visibility = options.visibility && show_topocentric;
    let show_uncertainties =
        options.uncertainties && realizations.len() > 1 && request.mode == EphemMode::Observables;
    let show_radar = config.radar.is_some()
        && config.abs_mag.is_some()
        && request.mode == EphemMode::Observables;

    // vector and elements outputs are always TT
    let force_tt = matches!(
        request.mode,
        EphemMode::StateVectors | EphemMode::Positions | EphemMode::Elements { .. }
    );
    let tt_output = config.tt_output || force_tt;

    // the annotation line belongs to the observables header block only
    if request.mode == EphemMode::Observables {
        if let Some(note) = &config.note {
            writeln!(out, "#{note}")?;
        }
    }
    match request.mode {
        EphemMode::StateVectors | EphemMode::Positions | EphemMode::Elements { .. } => {
            writeln!(
                out,
                "{:.5} {:.6} {}",
                request.start, request.step.days, request.n_steps
            )?;
        }
        EphemMode::Observables if !options.computer_friendly => {
            write_observables_header(
                out,
                request,
                show_visibility,
                show_alt_az,
                show_uncertainties,
                show_radar,
            )?;
        }
        _ => {}
    }

    let (site_lat, _) = frame.geodetic();
    let geocenter = ObserverFrame::geocentric(frame.body);
    let ctx = ObservablesCtx {
        options,
        config,
        frame,
        step: request.step,
        site_lat,
        show_alt_az,
        show_visibility,
        show_topocentric,
        show_radar,
        phase: collab.phase,
    };

    let mut histories: Vec<StepHistory> = realizations
        .iter()
        .map(|_| StepHistory {
            prev_epoch: states_epoch,
            detector: CloseApproachDetector::new(),
        })
        .collect();
    let mut sky_positions: Vec<SkyPosition> = Vec::with_capacity(realizations.len());
    let mut last_line_shown = true;

    for i in 0..request.n_steps {
        let mut curr = request.start + i as f64 * request.step.days;
        if options.round_to_nearest_step {
            curr = (curr / request.step.days).round() * request.step.days;
        }
        let (ephem_tt, utc) = if tt_output {
            (curr, tt_to_utc_mjd(curr))
        } else {
            (utc_to_tt_mjd(curr), curr)
        };

        let obs_posn = collab.locator.observer_position(ephem_tt, frame)?;
        let obs_vel = collab.locator.observer_velocity(ephem_tt, frame)?;
        let geo_posn = collab.locator.observer_position(ephem_tt, &geocenter)?;
        let obs_posn_equ = ecliptic_to_equatorial(&obs_posn);

        let mut show_this_line = true;
        sky_positions.clear();

        // primary realization: all per-line work
        collab.propagator.propagate(
            &mut realizations[0].state,
            histories[0].prev_epoch,
            ephem_tt,
        )?;
        let light_lag = request.mode == EphemMode::Observables;
        let geometry = step_geometry(
            &realizations[0].state,
            &obs_posn,
            &geo_posn,
            &obs_vel,
            light_lag,
        );

        match request.mode {
            EphemMode::StateVectors | EphemMode::Positions => {
                let line = vector_line(
                    curr,
                    &geometry,
                    request.mode == EphemMode::StateVectors,
                    &config.vector_options,
                );
                write!(out, "{line}")?;
            }
            EphemMode::Elements { style } => {
                let writer = collab.elements.as_deref_mut().ok_or_else(|| {
                    EphemerixError::ElementsWriter("no elements collaborator".to_string())
                })?;
                let with_comments = i + 1 == request.n_steps;
                let block =
                    writer.elements_block(&realizations[0].state, ephem_tt, style, with_comments)?;
                write!(out, "{block}")?;
                show_this_line = false;
                last_line_shown = false;
            }
            EphemMode::CloseApproaches => {
                if let Some(approach) = histories[0].detector.observe(
                    request.step.days,
                    curr,
                    &geometry.topo_equ,
                    &geometry.topo_vel_equ,
                    geometry.radial_vel,
                ) {
                    writeln!(
                        out,
                        "Close approach at {}: {}",
                        format_ephem_date(approach.epoch, StepUnit::Minutes, 0),
                        crate::formatters::format_distance(approach.distance, false)
                    )?;
                }
                show_this_line = false;
                last_line_shown = false;
            }
            EphemMode::Observables => {
                let earth_moon = collab.locator.earth_and_moon(ephem_tt);
                let (mut line, show, sky) = observables_line(
                    &ctx,
                    curr,
                    utc,
                    &geometry,
                    &obs_posn_equ,
                    earth_moon.as_ref(),
                );
                show_this_line = show;
                sky_positions.push(sky);

                if show_this_line && options.moids {
                    if let Some(moids) = collab.moids {
                        for planet in 1..=8usize {
                            let moid = moids.moid(&realizations[0].state, ephem_tt, planet)?;
                            line.push_str(&format!("{moid:8.4}"));
                        }
                    }
                }
                if !show_this_line {
                    line = if last_line_shown {
                        "................\n".to_string()
                    } else {
                        String::new()
                    };
                }
                write!(out, "{line}")?;
            }
        }
        histories[0].prev_epoch = ephem_tt;

        // uncertainty samples contribute sky positions only
        if show_uncertainties {
            for (idx, realization) in realizations.iter_mut().enumerate().skip(1) {
                collab.propagator.propagate(
                    &mut realization.state,
                    histories[idx].prev_epoch,
                    ephem_tt,
                )?;
                let sample = step_geometry(
                    &realization.state,
                    &obs_posn,
                    &geo_posn,
                    &obs_vel,
                    light_lag,
                );
                sky_positions.push(observables::sky_position(config, &sample));
                histories[idx].prev_epoch = ephem_tt;
            }
            if show_this_line {
                let ellipse = uncertainty_ellipse(&sky_positions)?;
                write!(
                    out,
                    "{}",
                    uncertainty_cell(
                        ellipse.major_axis,
                        ellipse.position_angle,
                        options.computer_friendly
                    )
                )?;
            }
        }

        if show_this_line {
            writeln!(out)?;
        }
        if request.mode == EphemMode::Observables {
            last_line_shown = show_this_line;
        }
    }
    Ok(())
}

/// File entry point: create `path` and run [`generate_ephemeris`] into it.
///
/// An unopenable path aborts the run before any stepping happens.
pub fn ephemeris_to_file(
    path: &Utf8Path,
    realizations: &mut [OrbitRealization],
    states_epoch: MJD,
    request: &EphemerisRequest,
    collab: &mut Collaborators<'_>,
) -> Result<(), EphemerixError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    generate_ephemeris(&mut out, realizations, states_epoch, request, collab)?;
    out.flush()?;
    Ok(())
}

/// Geodetic ground-track point below a geocentric position.
///
/// Rotates the equatorial vector into the body-fixed frame with the
/// sidereal angle, then recovers planetodetic latitude and altitude from
/// the parallax constants.
pub fn ground_track(
    geo_equ: &Vector3<f64>,
    gmst_rad: Radian,
    body: BodyIndex,
) -> (Radian, Radian, Meter) {
    let lon = {
        let raw = geo_equ.y.atan2(geo_equ.x) - gmst_rad;
        let wrapped = raw.rem_euclid(crate::constants::DPI);
        if wrapped > std::f64::consts::PI {
            wrapped - crate::constants::DPI
        } else {
            wrapped
        }
    };
    let radius = planet_radius_au(body);
    let rho_cos = geo_equ.xy().norm() / radius;
    let rho_sin = geo_equ.z / radius;
    let (lat, alt_m) = parallax_to_lat_alt(rho_cos, rho_sin, body);
    (lon, lat, alt_m)
}

#[cfg(test)]
mod ephemeris_test {
    use super::*;

    use crate::constants::EARTH;

    #[test]
    fn test_observer_frame_round_trip() {
        let lat = 0.5_f64;
        let frame = ObserverFrame::from_geodetic(EARTH, lat, 2400., 1.0).unwrap();
        assert!(frame.is_topocentric());
        let (lat_back, alt_back) = frame.geodetic();
        assert!((lat_back - lat).abs() < 1e-9);
        assert!((alt_back - 2400.).abs() < 1e-3);
    }

    #[test]
    fn test_geocentric_frame() {
        let frame = ObserverFrame::geocentric(EARTH);
        assert!(!frame.is_topocentric());
        assert_eq!(*frame.rho_cos_phi, 0.);
    }

    #[test]
    fn test_vector_digits_scaling() {
        // AU output keeps ten decimals; km output keeps one
        assert_eq!(vector_digits(1., 10), 10);
        assert_eq!(vector_digits(crate::constants::AU, 10), 1);
        // velocities start from twelve
        assert_eq!(vector_digits(1., 12), 12);
    }

    #[test]
    fn test_uncertainty_cell_ladder() {
        use crate::constants::RADSEC;
        assert_eq!(uncertainty_cell(3.2 * RADSEC, 0., false), "  3.2   0");
        assert_eq!(uncertainty_cell(250. * RADSEC, 0., false), "  250   0");
        assert_eq!(uncertainty_cell(30_000. * RADSEC, 0., false), " 500'   0");
        assert_eq!(uncertainty_cell(120_000. * RADSEC, 0., false), "  33d   0");
    }

    #[test]
    fn test_validate_roles() {
        let state = OrbitState {
            position: Vector3::new(1., 0., 0.),
            velocity: Vector3::new(0., 0.01, 0.),
        };
        let request = EphemerisRequest {
            frame: ObserverFrame::geocentric(EARTH),
            start: 60000.,
            step: crate::step_size::parse_step_size("1").unwrap(),
            n_steps: 1,
            mode: EphemMode::Positions,
            options: EphemerisOptions::default(),
            config: RunConfig::default(),
        };
        // sample listed first: rejected
        let bad = [
            OrbitRealization::sample(state),
            OrbitRealization::primary(state),
        ];
        assert!(matches!(
            validate(&bad, &request),
            Err(EphemerixError::Config(_))
        ));
        let good = [
            OrbitRealization::primary(state),
            OrbitRealization::sample(state),
        ];
        assert!(validate(&good, &request).is_ok());
    }
}
