use std::time::Instant;

use crate::simulation::engine::Simulation;
use crate::simulation::integrator::IntegratorKind;
use crate::simulation::states::NVec3;
use crate::sweep::trial::T_ORB;

/// Build an engine with the reference orbit at eccentricity `e`
fn make_orbit(kind: IntegratorKind, dt: f64, e: f64) -> Simulation {
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

/// Wall time per step and energy drift of every integrator over 100 orbits
/// Paste output directly into excel to graph
pub fn bench_integrators() {
    let periods = 100.0;
    let eccentricities = [0.0, 0.5, 0.9];
    let log_dts = [-3.0, -2.0, -1.0];

    println!("integrator,e,log_dt,steps,ns_per_step,rel_energy_error");

    for kind in IntegratorKind::ALL {
        for e in eccentricities {
            for log_dt in log_dts {
                let dt = 10f64.powf(log_dt) * T_ORB;
                let mut sim = make_orbit(kind, dt, e);

                let e0 = sim.bodies()[1].specific_energy();
                let t0 = Instant::now();
                if sim.integrate(periods * T_ORB, false, false).is_err() {
                    continue;
                }
                let elapsed = t0.elapsed().as_secs_f64();
                let e1 = sim.bodies()[1].specific_energy();

                let steps = sim.iterations();
                let ns_per_step = elapsed * 1e9 / steps.max(1) as f64;
                println!(
                    "{},{},{},{},{:.2},{:.3e}",
                    kind, e, log_dt, steps, ns_per_step, ((e1 - e0) / e0).abs()
                );
            }
        }
    }
}
