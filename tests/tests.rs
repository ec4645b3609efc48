use std::f64::consts::{FRAC_PI_2, TAU};
use std::time::Instant;

use kepsweep::simulation::integrator::IntegratorKind;
use kepsweep::simulation::kepler::{drift_eccentric, drift_universal, stumpff};
use kepsweep::simulation::states::{Body, NVec3, System};
use kepsweep::simulation::forces::{AccelSet, NewtonianGravity};
use kepsweep::{CancelToken, Clock, EngineError, Simulation};

/// Build a simple 2-body System separated along x-axis
pub fn two_body_system(dist: f64, m1: f64, m2: f64) -> System {
    let b1 = Body::new(m1, [-dist / 2.0, 0.0, 0.0].into(), NVec3::zeros());
    let b2 = Body::new(m2, [dist / 2.0, 0.0, 0.0].into(), NVec3::zeros());
    System {
        bodies: vec![b1, b2],
        t: 0.0,
    }
}

/// Build a gravity term + AccelSet with G = 1
pub fn gravity_set() -> AccelSet {
    AccelSet::new().with(NewtonianGravity { G: 1.0, eps2: 0.0 })
}

/// Unit mass at the origin and a test particle at pericentre of an orbit with a = 1
pub fn orbit(kind: IntegratorKind, dt: f64, e: f64) -> Simulation {
    let mut sim = Simulation::new();
    sim.set_integrator(kind);
    sim.set_force_is_velocity_dependent(false);
    sim.set_dt(dt);
    sim.add_body(1.0, NVec3::zeros(), NVec3::zeros());
    sim.add_body(
        0.0,
        NVec3::new(1.0 - e, 0.0, 0.0),
        NVec3::new(0.0, ((1.0 + e) / (1.0 - e)).sqrt(), 0.0),
    );
    sim
}

fn rel_energy_error(sim: &Simulation, e0: f64) -> f64 {
    ((sim.bodies()[1].specific_energy() - e0) / e0).abs()
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let sys = two_body_system(1.0, 2.0, 3.0);
    let forces = gravity_set();

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc);

    let net = acc[0] * sys.bodies[0].m + acc[1] * sys.bodies[1].m;

    assert!(net.norm() < 1e-12, "Net momentum not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let sys = two_body_system(2.0, 1.0, 1.0);
    let forces = gravity_set();

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc);

    let dx = sys.bodies[1].x - sys.bodies[0].x;
    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
}

#[test]
fn gravity_inverse_square_law() {
    let sys_r = two_body_system(1.0, 1.0, 1.0);
    let sys_2r = two_body_system(2.0, 1.0, 1.0);
    let forces = gravity_set();

    let mut acc_r = vec![NVec3::zeros(); 2];
    let mut acc_2r = vec![NVec3::zeros(); 2];

    forces.accumulate_accels(sys_r.t, &sys_r, &mut acc_r);
    forces.accumulate_accels(sys_2r.t, &sys_2r, &mut acc_2r);

    let ratio = acc_r[0].norm() / acc_2r[0].norm();

    assert!((ratio - 4.0).abs() < 1e-12, "Expected 4x, got {}", ratio);
}

#[test]
fn gravity_massless_body_does_not_pull() {
    let sys = two_body_system(1.0, 1.0, 0.0);
    let forces = gravity_set();

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc);

    assert_eq!(acc[0], NVec3::zeros());
    assert!((acc[1].norm() - 1.0).abs() < 1e-12);
}

#[test]
fn gravity_skipping_central_source() {
    // Three bodies on a line; with first = 1 body 0 pulls nobody
    let mut sys = two_body_system(2.0, 5.0, 1.0);
    sys.bodies.push(Body::new(1.0, [3.0, 0.0, 0.0].into(), NVec3::zeros()));
    let forces = gravity_set();

    let mut acc = vec![NVec3::zeros(); 3];
    forces.accumulate_from(0.0, &sys, 1, &mut acc);

    // Bodies 1 and 2 are 2 apart with unit masses
    assert!((acc[1].x - 0.25).abs() < 1e-12);
    assert!((acc[2].x + 0.25).abs() < 1e-12);
}

// ==================================================================================
// Kepler drift tests
// ==================================================================================

#[test]
fn kepler_quarter_circular_orbit() {
    for solver in [drift_eccentric, drift_universal] {
        let mut x = NVec3::new(1.0, 0.0, 0.0);
        let mut v = NVec3::new(0.0, 1.0, 0.0);
        solver(1.0, &mut x, &mut v, FRAC_PI_2);

        assert!((x - NVec3::new(0.0, 1.0, 0.0)).norm() < 1e-12, "x = {:?}", x);
        assert!((v - NVec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12, "v = {:?}", v);
    }
}

#[test]
fn kepler_full_period_returns_to_start() {
    let e: f64 = 0.9;
    let x0 = NVec3::new(1.0 - e, 0.0, 0.0);
    let v0 = NVec3::new(0.0, ((1.0 + e) / (1.0 - e)).sqrt(), 0.0);

    for solver in [drift_eccentric, drift_universal] {
        let (mut x, mut v) = (x0, v0);
        solver(1.0, &mut x, &mut v, TAU);
        assert!((x - x0).norm() < 1e-8, "x = {:?}", x);
        assert!((v - v0).norm() < 1e-7, "v = {:?}", v);
    }
}

#[test]
fn kepler_solvers_agree_on_elliptic_orbit() {
    let x0 = NVec3::new(0.5, 0.1, 0.0);
    let v0 = NVec3::new(-0.2, 1.4, 0.1);

    let (mut xa, mut va) = (x0, v0);
    let (mut xb, mut vb) = (x0, v0);
    drift_eccentric(1.0, &mut xa, &mut va, 1.3);
    drift_universal(1.0, &mut xb, &mut vb, 1.3);

    assert!((xa - xb).norm() < 1e-10);
    assert!((va - vb).norm() < 1e-10);
}

#[test]
fn kepler_hyperbolic_conserves_energy_and_momentum() {
    let mut x = NVec3::new(1.0, 0.0, 0.0);
    let mut v = NVec3::new(0.0, 2.0, 0.0);
    let energy = |x: &NVec3, v: &NVec3| 0.5 * v.norm_squared() - 1.0 / x.norm();
    let e0 = energy(&x, &v);
    let h0 = x.cross(&v);

    drift_eccentric(1.0, &mut x, &mut v, 5.0);

    assert!(x.norm() > 1.0, "particle should be receding");
    assert!((energy(&x, &v) - e0).abs() < 1e-10);
    assert!((x.cross(&v) - h0).norm() < 1e-10);
}

#[test]
fn stumpff_series_matches_closed_form_at_switch() {
    for z in [0.1, -0.1] {
        let below = stumpff(z * (1.0 - 1e-9));
        let above = stumpff(z * (1.0 + 1e-9));
        assert!((below.2 - above.2).abs() < 1e-10);
        assert!((below.3 - above.3).abs() < 1e-10);
    }
    let (c0, c1, c2, c3) = stumpff(0.0);
    assert_eq!((c0, c1, c2), (1.0, 1.0, 0.5));
    assert!((c3 - 1.0 / 6.0).abs() < 1e-15);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn integrators_conserve_energy_on_circular_orbit() {
    let dt = 1e-3 * TAU;
    for kind in IntegratorKind::ALL {
        let mut sim = orbit(kind, dt, 0.0);
        let e0 = sim.bodies()[1].specific_energy();
        sim.integrate(TAU, false, true).unwrap();

        let err = rel_energy_error(&sim, e0);
        let bound = if kind.is_kepler_split() { 1e-10 } else { 1e-4 };
        assert!(err < bound, "{kind}: energy error {err}");
    }
}

#[test]
fn kepler_split_is_exact_for_test_particle() {
    // Massless companion: the kick vanishes and any timestep is exact
    let e = 0.5;
    for kind in [IntegratorKind::Wh, IntegratorKind::Mikkola] {
        let mut sim = orbit(kind, 0.3 * TAU, e);
        let e0 = sim.bodies()[1].specific_energy();
        sim.integrate(20.0 * TAU, false, true).unwrap();
        assert!(rel_energy_error(&sim, e0) < 1e-9, "{kind}");
    }
}

#[test]
fn leapfrog_error_shrinks_with_timestep() {
    let e = 0.3;
    // Largest error seen over one orbit
    let err = |dt: f64| {
        let mut sim = orbit(IntegratorKind::Leapfrog, dt, e);
        let e0 = sim.bodies()[1].specific_energy();
        let mut worst: f64 = 0.0;
        for k in 1..=20 {
            sim.integrate(TAU * k as f64 / 20.0, false, true).unwrap();
            worst = worst.max(rel_energy_error(&sim, e0));
        }
        worst
    };
    assert!(err(1e-3 * TAU) < err(1e-2 * TAU));
}

#[test]
fn verlet_cache_matches_recomputed_accelerations() {
    let mut cached = orbit(IntegratorKind::Verlet, 1e-2, 0.2);
    let mut fresh = orbit(IntegratorKind::Verlet, 1e-2, 0.2);
    fresh.set_force_is_velocity_dependent(true);

    cached.integrate(3.0, false, true).unwrap();
    fresh.integrate(3.0, false, true).unwrap();

    assert_eq!(cached.bodies(), fresh.bodies());
}

#[test]
fn unsynchronized_run_matches_synchronized() {
    for kind in [IntegratorKind::Leapfrog, IntegratorKind::Wh, IntegratorKind::Mikkola] {
        let mut a = orbit(kind, 1e-2 * TAU, 0.1);
        let mut b = orbit(kind, 1e-2 * TAU, 0.1);
        a.integrate(TAU, false, true).unwrap();
        b.integrate(TAU, false, false).unwrap();

        assert!(b.is_synchronized());
        assert_eq!(a.iterations(), b.iterations());
        assert!((a.bodies()[1].x - b.bodies()[1].x).norm() < 1e-9, "{kind}");
    }
}

// ==================================================================================
// Engine API tests
// ==================================================================================

#[test]
fn engine_step_leaves_split_integrator_unsynchronized() {
    let mut sim = orbit(IntegratorKind::Leapfrog, 0.01, 0.0);
    assert!(sim.is_synchronized());
    sim.step();
    assert!(!sim.is_synchronized());
    assert_eq!(sim.iterations(), 1);
    sim.synchronize();
    assert!(sim.is_synchronized());
}

#[test]
fn engine_exact_finish_lands_on_end_time() {
    let mut sim = orbit(IntegratorKind::Leapfrog, 0.3, 0.0);
    sim.integrate(1.0, true, false).unwrap();
    assert!((sim.t() - 1.0).abs() < 1e-12);
    assert_eq!(sim.iterations(), 4);
    assert!(sim.is_synchronized());
}

#[test]
fn engine_without_exact_finish_overshoots_by_less_than_a_step() {
    let dt = 0.3;
    let mut sim = orbit(IntegratorKind::Rk4, dt, 0.0);
    sim.integrate(1.0, false, true).unwrap();
    assert!(sim.t() >= 1.0 && sim.t() < 1.0 + dt);
    assert_eq!(sim.iterations(), 4);
    assert!((sim.iterations() as f64 * dt / sim.t() - 1.0).abs() < 1e-12);
}

#[test]
fn engine_per_step_clock_is_deterministic() {
    let mut sim = orbit(IntegratorKind::Verlet, 0.05, 0.0);
    sim.set_clock(Clock::PerStep(1e-6));
    sim.integrate(2.0, false, true).unwrap();
    let expected = sim.iterations() as f64 * 1e-6;
    assert!((sim.timing() - expected).abs() < 1e-15);
}

#[test]
fn engine_rejects_bad_setups() {
    let mut sim = orbit(IntegratorKind::Leapfrog, 0.0, 0.0);
    assert_eq!(sim.integrate(1.0, false, true), Err(EngineError::InvalidTimestep(0.0)));

    let mut empty = Simulation::new();
    empty.set_dt(0.1);
    assert_eq!(empty.integrate(1.0, false, true), Err(EngineError::NoBodies));

    let mut massless = Simulation::new();
    massless.set_integrator(IntegratorKind::Mikkola);
    massless.set_dt(0.1);
    massless.add_body(0.0, NVec3::zeros(), NVec3::zeros());
    assert_eq!(massless.integrate(1.0, false, true), Err(EngineError::MasslessCentralBody));
}

#[test]
fn engine_selects_integrator_by_name() {
    let mut sim = Simulation::new();
    sim.set_integrator_by_name("WH").unwrap();
    assert_eq!(sim.integrator, IntegratorKind::Wh);
    assert_eq!(
        sim.set_integrator_by_name("ias15"),
        Err(EngineError::UnknownIntegrator("ias15".into()))
    );
}

#[test]
fn engine_reset_clears_everything() {
    let mut sim = orbit(IntegratorKind::Wh, 0.1, 0.0);
    sim.integrate(1.0, false, true).unwrap();
    sim.reset();
    assert!(sim.bodies().is_empty());
    assert_eq!(sim.iterations(), 0);
    assert_eq!(sim.t(), 0.0);
    assert_eq!(sim.timing(), 0.0);
    assert_eq!(sim.integrator, IntegratorKind::Leapfrog);
}

#[test]
fn engine_stops_when_cancelled() {
    let token = CancelToken::new();
    token.cancel();

    let mut sim = orbit(IntegratorKind::Leapfrog, 1e-3, 0.0);
    sim.set_cancel_token(token);
    assert_eq!(sim.integrate(1e6, false, true), Err(EngineError::Interrupted));
    assert_eq!(sim.iterations(), 1024);
    assert!(sim.is_synchronized());
}

#[test]
fn engine_stops_at_deadline() {
    let mut sim = orbit(IntegratorKind::Leapfrog, 1e-3, 0.0);
    sim.set_deadline(Instant::now());
    assert_eq!(sim.integrate(1e6, false, true), Err(EngineError::DeadlineExceeded));
    assert!(sim.t() < 1e6);
}

#[test]
fn engine_rejects_timestep_below_time_resolution() {
    let mut sim = orbit(IntegratorKind::Rk4, 1e17, 0.0);
    assert!(sim.integrate(1e17, false, true).is_ok());
    assert_eq!(sim.t(), 1e17);

    // 1e17 + 1 == 1e17: stepping can never reach t_end
    sim.set_dt(1.0);
    assert_eq!(sim.integrate(2e17, false, true), Err(EngineError::InvalidTimestep(1.0)));
    assert_eq!(sim.iterations(), 2);
}
