use super::{
    TerrainQuery,
    types::{SlideResult, SweepHit, Vec3},
};
use crate::{MAX_SLIDE_ITERATIONS, MIN_MOVE_SQ, settings::CapsuleSpec};

/// Kinematic sweep-and-slide for a capsule against static terrain.
///
/// Algorithm:
/// - Sweep the capsule along the remaining translation.
/// - On hit, move to just before the contact (minus `skin`) and slide along the contact normal.
/// - Iterate to handle corners until `MAX_SLIDE_ITERATIONS` or the remaining motion is negligible.
pub fn sweep_and_slide<T: TerrainQuery + ?Sized>(
    terrain: &T,
    capsule: &CapsuleSpec,
    start: Vec3,
    translation: Vec3,
    skin: f32,
) -> SlideResult {
    let mut pos = start;
    let mut remaining = translation;
    let mut last_hit: Option<SweepHit> = None;

    for _ in 0..MAX_SLIDE_ITERATIONS {
        if remaining.norm_squared() <= MIN_MOVE_SQ {
            break;
        }

        let len = remaining.norm();
        let dir = remaining / len;

        let Some(hit) = terrain.sweep_capsule(capsule, pos, remaining) else {
            // No hit, move fully and finish.
            pos += remaining;
            break;
        };

        // Travel up to the contact point (minus skin).
        let travel = (len * hit.fraction.clamp(0.0, 1.0)).max(0.0);
        pos += dir * (travel - skin).max(0.0);

        // Slide along the hit plane: remove the normal component from the leftover.
        let n = {
            let n_len_sq = hit.normal.norm_squared();
            if n_len_sq > 1.0e-12 {
                hit.normal / n_len_sq.sqrt()
            } else {
                Vec3::zeros()
            }
        };
        let leftover = dir * (len - travel);
        let slide = leftover - n * leftover.dot(&n);

        remaining = slide;
        last_hit = Some(hit);

        if slide.norm_squared() <= MIN_MOVE_SQ {
            break;
        }
    }

    SlideResult {
        end_pos: pos,
        last_hit,
    }
}
