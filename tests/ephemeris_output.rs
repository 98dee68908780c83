use nalgebra::Vector3;

use ephemerix::brightness::HgPhaseFunction;
use ephemerix::constants::{EARTH, MJD, RADSEC};
use ephemerix::ephemeris::{
    generate_ephemeris, Collaborators, EphemMode, EphemerisOptions, EphemerisRequest,
    ObserverFrame, OrbitRealization, OrbitState, RunConfig, VectorOptions,
};
use ephemerix::ephemerix_errors::EphemerixError;
use ephemerix::equatorial_to_ecliptic;
use ephemerix::providers::{ElementsStyle, ElementsWriter, ObserverLocator, OrbitPropagator};
use ephemerix::step_size::parse_step_size;

/// Force-free propagation; exact for the straight-line scenarios below.
struct LinearPropagator;

impl OrbitPropagator for LinearPropagator {
    fn propagate(&self, state: &mut OrbitState, from: MJD, to: MJD) -> Result<(), EphemerixError> {
        state.position += state.velocity * (to - from);
        Ok(())
    }
}

/// Observer pinned to one heliocentric ecliptic position, at rest.
struct FixedObserver(Vector3<f64>);

impl ObserverLocator for FixedObserver {
    fn observer_position(
        &self,
        _epoch: MJD,
        _frame: &ObserverFrame,
    ) -> Result<Vector3<f64>, EphemerixError> {
        Ok(self.0)
    }

    fn observer_velocity(
        &self,
        _epoch: MJD,
        _frame: &ObserverFrame,
    ) -> Result<Vector3<f64>, EphemerixError> {
        Ok(Vector3::zeros())
    }
}

/// Observer with scripted lunar data for the visibility codes. The Moon is
/// supplied as a geocentric ecliptic offset from the site.
struct SkyWatchObserver {
    site: Vector3<f64>,
    moon_geo: Option<Vector3<f64>>,
}

impl ObserverLocator for SkyWatchObserver {
    fn observer_position(
        &self,
        _epoch: MJD,
        _frame: &ObserverFrame,
    ) -> Result<Vector3<f64>, EphemerixError> {
        Ok(self.site)
    }

    fn observer_velocity(
        &self,
        _epoch: MJD,
        _frame: &ObserverFrame,
    ) -> Result<Vector3<f64>, EphemerixError> {
        Ok(Vector3::zeros())
    }

    fn earth_and_moon(&self, _epoch: MJD) -> Option<(Vector3<f64>, Vector3<f64>)> {
        self.moon_geo.map(|geo| (self.site, self.site + geo))
    }
}

/// Elements collaborator double: records the final-step comment flag and
/// emits a one-line block per epoch.
struct RecordingElementsWriter {
    comment_flags: Vec<bool>,
}

impl ElementsWriter for RecordingElementsWriter {
    fn elements_block(
        &mut self,
        state: &OrbitState,
        epoch: MJD,
        _style: ElementsStyle,
        with_comments: bool,
    ) -> Result<String, EphemerixError> {
        self.comment_flags.push(with_comments);
        Ok(format!(
            "a={:.3} epoch={:.1}{}\n",
            state.position.norm(),
            epoch,
            if with_comments { "  (final)" } else { "" }
        ))
    }
}

fn run_to_string(
    realizations: &mut [OrbitRealization],
    states_epoch: MJD,
    request: &EphemerisRequest,
    locator: &dyn ObserverLocator,
) -> String {
    let phase = HgPhaseFunction::default();
    let mut collab = Collaborators {
        propagator: &LinearPropagator,
        locator,
        elements: None,
        moids: None,
        phase: &phase,
    };
    let mut out = Vec::new();
    generate_ephemeris(&mut out, realizations, states_epoch, request, &mut collab).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_observables_lines() {
    // Object at rest 0.2 AU beyond a fixed observer at (1, 0, 0): the whole
    // line is predictable by hand. RA = Dec = 0, delta 0.2 AU, r 1.2 AU,
    // elongation exactly 180 degrees, V = 18 + 5 log10(1.2 * 0.2) = 14.90.
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(1.2, 0., 0.),
        velocity: Vector3::zeros(),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 2,
        mode: EphemMode::Observables,
        options: EphemerisOptions::default(),
        config: RunConfig {
            abs_mag: Some(18.),
            note: Some("geocentric test run".to_string()),
            ..RunConfig::default()
        },
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::new(1., 0., 0.)),
    );

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "#geocentric test run");
    assert_eq!(
        lines[1],
        "Date (UTC)   RA              Dec         delta   r     elong  mag"
    );
    assert_eq!(
        lines[2],
        "---- -- --  ------------   ------------  ------ ------ -----  ---"
    );
    assert_eq!(
        lines[3],
        "2023 02 25  00 00 00.000   +00 00 00.00  .20000 1.2000 180.0 15.0"
    );
    // static geometry, next day: only the date moves
    assert_eq!(
        lines[4],
        "2023 02 26  00 00 00.000   +00 00 00.00  .20000 1.2000 180.0 15.0"
    );
}

#[test]
fn test_hourly_run_date_column_matches_header() {
    // An hour-stepped run shows an hour field and nothing finer, keeping
    // every later column at the offset the header advertises.
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(1.2, 0., 0.),
        velocity: Vector3::zeros(),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1h").unwrap(),
        n_steps: 2,
        mode: EphemMode::Observables,
        options: EphemerisOptions::default(),
        config: RunConfig {
            abs_mag: Some(18.),
            ..RunConfig::default()
        },
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::new(1., 0., 0.)),
    );

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "Date (UTC) HH   RA              Dec         delta   r     elong  mag"
    );
    assert_eq!(
        lines[1],
        "---- -- -- --  ------------   ------------  ------ ------ -----  ---"
    );
    assert_eq!(
        lines[2],
        "2023 02 25 00  00 00 00.000   +00 00 00.00  .20000 1.2000 180.0 15.0"
    );
    assert_eq!(
        lines[3],
        "2023 02 25 01  00 00 00.000   +00 00 00.00  .20000 1.2000 180.0 15.0"
    );
    // the RA column sits at the same place relative to its title in hour
    // and day runs alike
    let header_ra = lines[0].find("RA").unwrap();
    let data_ra = lines[2].find("00 00 00.000").unwrap();
    assert_eq!(header_ra - data_ra, 1);
}

#[test]
fn test_doubtful_magnitude_marker() {
    // Object directly between the Sun and the observer: phase angle 180
    // degrees, where the H-G system breaks down, so the magnitude cell is
    // patched with a question mark.
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(0.9, 0., 0.),
        velocity: Vector3::zeros(),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 1,
        mode: EphemMode::Observables,
        options: EphemerisOptions::default(),
        config: RunConfig {
            abs_mag: Some(18.),
            // keep the (enormous) backlit magnitude on the line
            mag_limit: 1200.,
            ..RunConfig::default()
        },
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::new(1., 0., 0.)),
    );

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[2],
        "2023 02 25  12 00 00.000   +00 00 00.00  .10000 .90000   0.0 763?"
    );
}

#[test]
fn test_visibility_codes() {
    // Site at the north pole: the altitude of any body collapses to its
    // declination, so the codes do not depend on the sidereal time. The
    // object sits 0.2 AU away at declination +45, always above the horizon.
    let up = 0.2 * std::f64::consts::FRAC_1_SQRT_2;
    let dir_equ = Vector3::new(up, 0., up);
    let run = |site: Vector3<f64>, moon_geo: Option<Vector3<f64>>| -> String {
        let mut realizations = [OrbitRealization::primary(OrbitState {
            position: site + equatorial_to_ecliptic(&dir_equ),
            velocity: Vector3::zeros(),
        })];
        let request = EphemerisRequest {
            frame: ObserverFrame::from_geodetic(EARTH, std::f64::consts::FRAC_PI_2, 0., 0.)
                .unwrap(),
            start: 60000.,
            step: parse_step_size("1").unwrap(),
            n_steps: 1,
            mode: EphemMode::Observables,
            options: EphemerisOptions {
                visibility: true,
                ..EphemerisOptions::default()
            },
            config: RunConfig::default(),
        };
        let locator = SkyWatchObserver { site, moon_geo };
        let text = run_to_string(&mut realizations, 60000., &request, &locator);
        text.lines().last().unwrap().to_string()
    };

    // sun five degrees up, no lunar data
    let line = run(Vector3::new(1., 0., -0.1), None);
    assert!(line.ends_with(" * "), "{line:?}");
    // sun three degrees down: civil twilight
    let line = run(Vector3::new(1., 0., 0.055), None);
    assert!(line.ends_with(" C "), "{line:?}");
    // moon up, on its sunlit side
    let line = run(
        Vector3::new(1., 0., 0.055),
        Some(Vector3::new(0.0026, 0., 0.001)),
    );
    assert!(line.ends_with(" CM"), "{line:?}");
    // moon up, on its dark side
    let line = run(
        Vector3::new(1., 0., 0.055),
        Some(Vector3::new(-0.002, 0., 0.0018)),
    );
    assert!(line.ends_with(" Cm"), "{line:?}");
}

#[test]
fn test_elements_snapshots_spliced() {
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(1.5, 0., 0.),
        velocity: Vector3::zeros(),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 3,
        mode: EphemMode::Elements {
            style: ElementsStyle::EightLine,
        },
        options: EphemerisOptions::default(),
        config: RunConfig::default(),
    };
    let phase = HgPhaseFunction::default();
    let locator = FixedObserver(Vector3::zeros());
    let mut writer = RecordingElementsWriter {
        comment_flags: Vec::new(),
    };
    let mut collab = Collaborators {
        propagator: &LinearPropagator,
        locator: &locator,
        elements: Some(&mut writer),
        moids: None,
        phase: &phase,
    };
    let mut out = Vec::new();
    generate_ephemeris(&mut out, &mut realizations, 60000., &request, &mut collab).unwrap();

    // start/step/count header, then one block per epoch; the comment flag
    // fires only on the final step
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "60000.00000 1.000000 3\n\
         a=1.500 epoch=60000.0\n\
         a=1.500 epoch=60001.0\n\
         a=1.500 epoch=60002.0  (final)\n"
    );
    assert_eq!(writer.comment_flags, vec![false, false, true]);

    // the splice has no fallback without its collaborator
    let mut no_writer = Collaborators {
        propagator: &LinearPropagator,
        locator: &locator,
        elements: None,
        moids: None,
        phase: &phase,
    };
    let mut out = Vec::new();
    assert!(matches!(
        generate_ephemeris(&mut out, &mut realizations, 60002., &request, &mut no_writer),
        Err(EphemerixError::ElementsWriter(_))
    ));
}

#[test]
fn test_faint_object_collapses_to_placeholder() {
    // Same object, but with the limit at magnitude 10 every line is
    // suppressed; a single placeholder marks the first gap and the
    // following suppressed steps emit nothing.
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(1.2, 0., 0.),
        velocity: Vector3::zeros(),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 3,
        mode: EphemMode::Observables,
        options: EphemerisOptions::default(),
        config: RunConfig {
            abs_mag: Some(18.),
            mag_limit: 10.,
            ..RunConfig::default()
        },
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::new(1., 0., 0.)),
    );

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "................");
}

#[test]
fn test_uncertainty_cell_from_two_realizations() {
    // One sample displaced 3 arcseconds along the ecliptic pole from the
    // primary. The two-point fit reports the separation directly; the
    // position angle lands at 67 degrees once the obliquity tilts the
    // offset in the equatorial frame.
    let offset = 3. * RADSEC * 0.2;
    let mut realizations = [
        OrbitRealization::primary(OrbitState {
            position: Vector3::new(1.2, 0., 0.),
            velocity: Vector3::zeros(),
        }),
        OrbitRealization::sample(OrbitState {
            position: Vector3::new(1.2, 0., offset),
            velocity: Vector3::zeros(),
        }),
    ];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 1,
        mode: EphemMode::Observables,
        options: EphemerisOptions {
            uncertainties: true,
            ..EphemerisOptions::default()
        },
        config: RunConfig::default(),
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::new(1., 0., 0.)),
    );

    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].ends_with(" \" sig PA"));
    assert_eq!(
        lines[2],
        "2023 02 25  00 00 00.000   +00 00 00.00  .20000 1.2000 180.0  3.0  67"
    );
}

#[test]
fn test_state_vector_output() {
    // Heliocentric vectors (observer at the origin), ecliptic frame so the
    // equatorial rotation round-trips away. Header carries start, step and
    // count; each line is the epoch plus six sixteen-character components.
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(1.5, 0.25, 0.),
        velocity: Vector3::new(0., 0.01, 0.),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 2,
        mode: EphemMode::StateVectors,
        options: EphemerisOptions::default(),
        config: RunConfig {
            vector_options: VectorOptions {
                ecliptic: true,
                ..VectorOptions::default()
            },
            ..RunConfig::default()
        },
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::zeros()),
    );

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "60000.00000 1.000000 2");
    assert_eq!(
        lines[1],
        "60000.00000    1.5000000000    0.2500000000    0.0000000000   \
         0.000000000000   0.010000000000   0.000000000000"
    );
    assert_eq!(
        lines[2],
        "60001.00000    1.5000000000    0.2600000000    0.0000000000   \
         0.000000000000   0.010000000000   0.000000000000"
    );
}

#[test]
fn test_close_approach_log() {
    // Straight-line flyby past an observer at the origin, closest at
    // MJD 60002 with a 0.001 AU (~150 000 km) miss distance.
    let mut realizations = [OrbitRealization::primary(OrbitState {
        position: Vector3::new(-0.2, 0.001, 0.),
        velocity: Vector3::new(0.1, 0., 0.),
    })];
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 5,
        mode: EphemMode::CloseApproaches,
        options: EphemerisOptions::default(),
        config: RunConfig {
            tt_output: true,
            // annotations only decorate observables output
            note: Some("flyby".to_string()),
            ..RunConfig::default()
        },
    };
    let text = run_to_string(
        &mut realizations,
        60000.,
        &request,
        &FixedObserver(Vector3::zeros()),
    );

    assert_eq!(text, "Close approach at 2023 02 27 00:00:  149598\n");
}

#[test]
fn test_misconfigured_runs_rejected() {
    let state = OrbitState {
        position: Vector3::new(1.2, 0., 0.),
        velocity: Vector3::zeros(),
    };
    let request = EphemerisRequest {
        frame: ObserverFrame::geocentric(EARTH),
        start: 60000.,
        step: parse_step_size("1").unwrap(),
        n_steps: 1,
        mode: EphemMode::Observables,
        options: EphemerisOptions::default(),
        config: RunConfig::default(),
    };
    let phase = HgPhaseFunction::default();
    let locator = FixedObserver(Vector3::new(1., 0., 0.));
    let mut collab = Collaborators {
        propagator: &LinearPropagator,
        locator: &locator,
        elements: None,
        moids: None,
        phase: &phase,
    };
    let mut out = Vec::new();

    // two primaries
    let mut two_primaries = [
        OrbitRealization::primary(state),
        OrbitRealization::primary(state),
    ];
    assert!(matches!(
        generate_ephemeris(&mut out, &mut two_primaries, 60000., &request, &mut collab),
        Err(EphemerixError::Config(_))
    ));
    // nothing may have been written before the rejection
    assert!(out.is_empty());
}
