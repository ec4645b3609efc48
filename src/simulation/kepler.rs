//! Kepler drift solvers for the Wisdom-Holman integrators
//!
//! Both solvers advance a relative position/velocity pair along the exact
//! two-body orbit with gravitational parameter `mu` using Gauss' f and g
//! functions. They differ only in how Kepler's equation is solved:
//!
//! - [`drift_eccentric`] works in eccentric anomaly (bound orbits only and
//!   falls back to the universal solver otherwise)
//! - [`drift_universal`] works in the universal anomaly `s` with Stumpff
//!   functions, valid for every orbit type
//!
//! Kepler's equation is monotone in the anomaly in both forms, so the roots
//! are found with a bracketed Newton iteration that bisects whenever a Newton
//! step leaves the bracket.

use std::f64::consts::TAU;

use super::states::NVec3;

const MAX_ITER: usize = 64;
const TOL: f64 = 1e-15;

/// Advance `(x, v)` by `dt` along a Kepler orbit, eccentric-anomaly form
pub fn drift_eccentric(mu: f64, x: &mut NVec3, v: &mut NVec3, dt: f64) {
    // Current separation |x|
    let r0 = x.norm();

    // Vis-viva: v^2 = mu (2/r - 1/a)  =>  1/a = 2/r - v^2/mu
    let inv_a = 2.0 / r0 - v.norm_squared() / mu;
    if !(inv_a > 0.0) {
        // 1/a <= 0: parabolic or hyperbolic, no eccentric anomaly
        drift_universal(mu, x, v, dt);
        return;
    }

    // Semi-major axis a and mean motion n = sqrt(mu / a^3)
    let a = inv_a.recip();
    let n = (mu * inv_a * inv_a * inv_a).sqrt();

    // Orbit state at the start in terms of E0:
    // - r0 = a (1 - e cos E0)    =>  e cos E0 = 1 - r0/a
    // - x.v = sqrt(mu a) e sin E0
    let ecos = 1.0 - r0 * inv_a;
    let esin = x.dot(v) / (mu * a).sqrt();

    // Mean anomaly advanced over dt. Whole periods bring the body back
    // where it started, so only the phase within one orbit is kept
    let dm = (n * dt).rem_euclid(TAU);
    let dt = dm / n;

    // Kepler's equation for the change dE = E - E0:
    //   dm = dE - e cos E0 sin dE + e sin E0 (1 - cos dE)
    // derivative in dE:
    //   1 - e cos E0 cos dE + e sin E0 sin dE = r / a > 0
    // so it is monotone, and the extra terms are bounded by 2e < 2,
    // which gives the bracket [dm - 2, dm + 2]
    let kepler = |de: f64| {
        let (s, c) = de.sin_cos();
        (
            de - ecos * s + esin * (1.0 - c) - dm,
            1.0 - ecos * c + esin * s,
        )
    };
    let de = solve_monotone(kepler, dm - 2.0, dm + 2.0, dm);

    // New separation r = a (1 - e cos E)
    let (s, c) = de.sin_cos();
    let r = a * (1.0 - ecos * c + esin * s);

    // Gauss f and g functions in eccentric anomaly:
    //   f    = 1 - a/r0 (1 - cos dE)
    //   g    = dt + (sin dE - dE) / n
    //   fdot = -a^2 n sin dE / (r r0)
    //   gdot = 1 - a/r (1 - cos dE)
    let f = 1.0 - a / r0 * (1.0 - c);
    let g = dt + (s - de) / n;
    let fdot = -a * a * n * s / (r * r0);
    let gdot = 1.0 - a / r * (1.0 - c);

    // x = f x0 + g v0, v = fdot x0 + gdot v0
    let (x0, v0) = (*x, *v);
    *x = f * x0 + g * v0;
    *v = fdot * x0 + gdot * v0;
}

/// Advance `(x, v)` by `dt` along a Kepler orbit, universal-variable form
pub fn drift_universal(mu: f64, x: &mut NVec3, v: &mut NVec3, dt: f64) {
    // r0 = |x|, eta = x.v (radial velocity times r0)
    let r0 = x.norm();
    let eta = x.dot(v);

    // beta = mu / a = 2 mu / r - v^2, positive for bound orbits
    let beta = 2.0 * mu / r0 - v.norm_squared();

    // Bound orbits: period P = 2 pi mu / beta^(3/2). Reduce dt to one period;
    // one full period corresponds to s = 2 pi / sqrt(beta), which brackets s
    let (dt, lo, hi) = if beta > 0.0 {
        let sqrt_beta = beta.sqrt();
        let period = TAU * mu / (beta * sqrt_beta);
        (dt.rem_euclid(period), 0.0, TAU / sqrt_beta)
    } else {
        let (lo, hi) = unbound_bracket(mu, r0, eta, beta, dt);
        (dt, lo, hi)
    };

    // t(s) = r0 G1 + eta G2 + mu G3 and dt/ds = r(s) = r0 G0 + eta G1 + mu G2,
    // with G_k = s^k c_k(beta s^2)
    let kepler = |s: f64| {
        let (c0, c1, c2, c3) = stumpff(beta * s * s);
        (
            r0 * s * c1 + eta * s * s * c2 + mu * s * s * s * c3 - dt,
            r0 * c0 + eta * s * c1 + mu * s * s * c2,
        )
    };
    // ds/dt = 1/r, so dt / r0 is the first-order guess
    let s = solve_monotone(kepler, lo, hi, (dt / r0).clamp(lo, hi));

    // Stumpff values at the root, and the new separation r(s)
    let (c0, c1, c2, c3) = stumpff(beta * s * s);
    let r = r0 * c0 + eta * s * c1 + mu * s * s * c2;

    // Gauss f and g functions in universal variables:
    //   f    = 1 - mu G2 / r0
    //   g    = dt - mu G3
    //   fdot = -mu G1 / (r r0)
    //   gdot = 1 - mu G2 / r
    let f = 1.0 - mu * s * s * c2 / r0;
    let g = dt - mu * s * s * s * c3;
    let fdot = -mu * s * c1 / (r * r0);
    let gdot = 1.0 - mu * s * s * c2 / r;

    // x = f x0 + g v0, v = fdot x0 + gdot v0
    let (x0, v0) = (*x, *v);
    *x = f * x0 + g * v0;
    *v = fdot * x0 + gdot * v0;
}

/// Stumpff functions `(c0, c1, c2, c3)` at `z`
pub fn stumpff(z: f64) -> (f64, f64, f64, f64) {
    let (c2, c3) = if z > 0.1 {
        let sz = z.sqrt();
        ((1.0 - sz.cos()) / z, (sz - sz.sin()) / (z * sz))
    } else if z < -0.1 {
        let sz = (-z).sqrt();
        ((sz.cosh() - 1.0) / -z, (sz.sinh() - sz) / (-z * sz))
    } else {
        // c2 = sum (-z)^k / (2k+2)!, c3 = sum (-z)^k / (2k+3)!
        let mut term2 = 0.5;
        let mut term3 = 1.0 / 6.0;
        let mut c2 = term2;
        let mut c3 = term3;
        for k in 1..10 {
            let k = k as f64;
            term2 *= -z / ((2.0 * k + 1.0) * (2.0 * k + 2.0));
            term3 *= -z / ((2.0 * k + 2.0) * (2.0 * k + 3.0));
            c2 += term2;
            c3 += term3;
        }
        (c2, c3)
    };
    (1.0 - z * c2, 1.0 - z * c3, c2, c3)
}

/// Grow a bracket around the root of the unbound Kepler equation
fn unbound_bracket(mu: f64, r0: f64, eta: f64, beta: f64, dt: f64) -> (f64, f64) {
    let time_of = |s: f64| {
        let (_, c1, c2, c3) = stumpff(beta * s * s);
        r0 * s * c1 + eta * s * s * c2 + mu * s * s * s * c3
    };
    // Start near s ~ dt / r0 and double until t(s) passes |dt|.
    // t(s) is monotone, so the root then lies in [0, bound]
    let mut bound = (dt.abs() / r0).max(1e-12).min(1.0);
    for _ in 0..MAX_ITER {
        let t = time_of(bound.copysign(dt));
        if !t.is_finite() || t.abs() >= dt.abs() {
            break;
        }
        bound *= 2.0;
    }
    if dt >= 0.0 { (0.0, bound) } else { (-bound, 0.0) }
}

/// Root of an increasing function `f` inside `[lo, hi]`, Newton with a
/// bisection fallback. `func` returns `(f(x), f'(x))`.
fn solve_monotone<F>(func: F, mut lo: f64, mut hi: f64, guess: f64) -> f64
where
    F: Fn(f64) -> (f64, f64),
{
    let mut x = guess;
    for _ in 0..MAX_ITER {
        let (f, df) = func(x);
        if f == 0.0 || !f.is_finite() {
            return x;
        }
        // f increasing: a negative value means the root is to the right
        if f < 0.0 {
            lo = x;
        } else {
            hi = x;
        }
        // Newton step, bisect when it leaves the bracket
        let mut next = x - f / df;
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }
        // Converged to relative tolerance
        if (next - x).abs() <= TOL * (1.0 + next.abs()) {
            return next;
        }
        x = next;
    }
    x
}
