//! Closed-form dynamics of the pendulum.
use crate::PendulumEnvConfig;
use std::f32::consts::PI;

/// Wraps an angle into `[-π, π)`.
pub fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// Advances `(θ, θ̇)` by one time step under torque `u`.
///
/// The torque is clipped into `[-max_torque, max_torque]`. Returns the next
/// `(θ, θ̇)` and the reward of the transition.
pub fn next_state(config: &PendulumEnvConfig, th: f32, thdot: f32, u: f32) -> (f32, f32, f32) {
    let PendulumEnvConfig {
        g, m, l, dt, max_speed, max_torque, ..
    } = *config;
    let u = u.max(-max_torque).min(max_torque);
    let costs = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);

    let newthdot = thdot + (-3.0 * g / (2.0 * l) * (th + PI).sin() + 3.0 / (m * l.powi(2)) * u) * dt;
    let newth = th + newthdot * dt;
    let newthdot = newthdot.max(-max_speed).min(max_speed);

    (newth, newthdot, -costs)
}
