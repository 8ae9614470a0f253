use super::support::FallingBelow;

/// `v + g * dt`.
pub fn next_velocity(velocity: f32, gravity: f32, dt: f32) -> f32 {
    velocity + gravity * dt
}

/// Unswept vertical move of a falling block centred at `z`.
///
/// `half_extent` is half the footprint edge. If another falling block is
/// underneath, the move stops at its top face and the faster block slows to
/// the slower one's velocity; there is no other collision response.
pub fn advance(
    z: f32,
    half_extent: f32,
    velocity: f32,
    dt: f32,
    falling_below: Option<FallingBelow>,
) -> (f32, f32) {
    let moved = z + velocity * dt;
    match falling_below {
        Some(below) if moved - half_extent < below.top_z => {
            let clamped = (below.top_z + half_extent).min(z);
            (clamped, velocity.max(below.velocity))
        }
        _ => (moved, velocity),
    }
}
