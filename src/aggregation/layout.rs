//! Deterministic placement of module nodes on a sphere.

use crate::core::Position;

const RADIUS: f64 = 5.0;

/// Spread `count` points over a sphere of radius 5 along a golden-angle
/// style spiral. The same count always yields the same positions.
pub fn sphere_positions(count: usize) -> Vec<Position> {
    let denominator = count.max(1) as f64;
    let spiral = (count as f64 * std::f64::consts::PI).sqrt();
    (0..count)
        .map(|i| {
            let phi = (-1.0 + 2.0 * i as f64 / denominator).clamp(-1.0, 1.0).acos();
            let theta = spiral * phi;
            Position {
                x: RADIUS * theta.cos() * phi.sin(),
                y: RADIUS * theta.sin() * phi.sin(),
                z: RADIUS * phi.cos(),
            }
        })
        .collect()
}
