use glam::Vec3;

use crate::{block, world::World};

/// Step length used while marching the ray through the world, in blocks.
const STEP: f32 = 0.05;
/// Maximum distance a ray is allowed to travel before giving up.
const MAX_DISTANCE: f32 = 10.0;

/// Result of a successful voxel-edit raycast: the hit block and, if present, the empty cell
/// immediately before it along the ray (where a new block would be placed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaycastHit {
    pub block: (i32, i32, i32),
    pub before: Option<(i32, i32, i32)>,
}

/// Marches a ray from `origin` along `direction` in fixed `0.05`-unit steps, up to `MAX_DISTANCE`,
/// stopping at the first non-Air cell. `direction` need not be normalized.
pub fn cast(world: &World, origin: Vec3, direction: Vec3) -> Option<RaycastHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let mut traveled = 0.0;
    let mut last_empty: Option<(i32, i32, i32)> = None;

    while traveled < MAX_DISTANCE {
        let sample = origin + direction * traveled;
        let cell = (
            sample.x.floor() as i32,
            sample.y.floor() as i32,
            sample.z.floor() as i32,
        );

        let here = world.get_block(cell.0, cell.1, cell.2);
        if here != block::AIR {
            return Some(RaycastHit {
                block: cell,
                before: last_empty,
            });
        }

        last_empty = Some(cell);
        traveled += STEP;
    }

    None
}

/// Removes the first non-Air block the ray hits, if any.
pub fn remove(world: &mut World, origin: Vec3, direction: Vec3) {
    if let Some(hit) = cast(world, origin, direction) {
        world.set_block(hit.block.0, hit.block.1, hit.block.2, block::AIR);
    }
}

/// Places `block` in the empty cell immediately before the ray's first hit, if the ray hit
/// anything and that cell exists (the ray didn't start inside a solid block).
pub fn place(world: &mut World, origin: Vec3, direction: Vec3, block: block::BlockId) {
    if let Some(hit) = cast(world, origin, direction) {
        if let Some((x, y, z)) = hit.before {
            world.set_block(x, y, z, block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_against_empty_world_finds_nothing() {
        let world = World::new(1, 4);
        assert_eq!(cast(&world, Vec3::new(0.5, 60.0, 0.5), Vec3::NEG_Y), None);
    }

    #[test]
    fn remove_clears_the_first_solid_block_hit() {
        let mut world = World::new(1, 4);
        world.set_block(0, 60, 0, block::STONE);

        remove(&mut world, Vec3::new(0.5, 65.0, 0.5), Vec3::NEG_Y);

        assert_eq!(world.get_block(0, 60, 0), block::AIR);
    }

    #[test]
    fn place_fills_the_cell_just_before_the_hit() {
        let mut world = World::new(1, 4);
        world.set_block(0, 60, 0, block::STONE);

        place(&mut world, Vec3::new(0.5, 65.0, 0.5), Vec3::NEG_Y, block::WOOD);

        assert_eq!(world.get_block(0, 61, 0), block::WOOD);
        assert_eq!(world.get_block(0, 60, 0), block::STONE);
    }

    #[test]
    fn ray_beyond_max_distance_finds_nothing() {
        let mut world = World::new(1, 4);
        world.set_block(0, 0, 0, block::STONE);

        let far_above = Vec3::new(0.5, (MAX_DISTANCE * 2.0) + 60.0, 0.5);
        assert_eq!(cast(&world, far_above, Vec3::NEG_Y), None);
    }
}
