use derive_more::{Add, From, Sub};
use glam::{IVec3, Vec3};

use crate::{
    block::{self, BlockId},
    terrain_gen::TerrainGen,
    util::face::FaceIndex,
    world::World,
};

/// Size of a chunk along the X and Z axes, in blocks
pub const SIZE: i32 = 16;
/// Size of a chunk along the Y axis, in blocks
pub const HEIGHT: i32 = 64;

const VOXEL_COUNT: usize = (SIZE * HEIGHT * SIZE) as usize;
const COLUMN_COUNT: usize = (SIZE * SIZE) as usize;
const EXTENDED_SIZE: i32 = SIZE + 2;
const EXTENDED_COLUMN_COUNT: usize = (EXTENDED_SIZE * EXTENDED_SIZE) as usize;

/// Position of a chunk in chunk units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Add, Sub, From)]
pub struct ChunkPos(pub IVec3);

impl ChunkPos {
    pub const ZERO: Self = Self(IVec3::ZERO);

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    pub fn as_ivec3(self) -> IVec3 {
        self.0
    }

    pub fn as_vec3(self) -> Vec3 {
        self.0.as_vec3()
    }

    /// The chunk position one step over in face direction `dir`.
    pub fn offset(self, dir: FaceIndex) -> Self {
        Self(self.0 + crate::util::face::FACE_NORMALS[dir.as_usize()])
    }

    /// Chunk coordinates containing the given world-block position, using floor division so that
    /// negative world coordinates convert correctly.
    pub fn from_world_block(world_x: i32, world_y: i32, world_z: i32) -> Self {
        Self(IVec3::new(
            world_x.div_euclid(SIZE),
            world_y.div_euclid(HEIGHT),
            world_z.div_euclid(SIZE),
        ))
    }
}

/// Voxel position local to a chunk, in `[0, SIZE) x [0, HEIGHT) x [0, SIZE)`.
fn voxel_index(x: i32, y: i32, z: i32) -> usize {
    ((x * HEIGHT + y) * SIZE + z) as usize
}

/// Index into `extended_heights`, which covers `[-1, SIZE]` on both horizontal axes.
fn extended_index(x: i32, z: i32) -> usize {
    ((x + 1) * EXTENDED_SIZE + (z + 1)) as usize
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkFlags {
    pub is_generated: bool,
    pub is_dirty: bool,
    pub is_mesh_dirty: bool,
    pub is_meshing: bool,
}

/// A fixed `SIZE x HEIGHT x SIZE` block of voxels plus the per-chunk bookkeeping the world and
/// mesher need: neighbor back-references, dirty flags, and cached column heights for the
/// extended (one-block apron) border.
pub struct Chunk {
    position: ChunkPos,
    voxels: Vec<BlockId>,
    version: u64,
    generation_seed: u32,
    neighbors: [Option<ChunkPos>; 6],
    flags: ChunkFlags,
    column_heights: Vec<i32>,
    extended_heights: Vec<i32>,
}

impl Chunk {
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            voxels: vec![block::AIR; VOXEL_COUNT],
            version: 0,
            generation_seed: 0,
            neighbors: [None; 6],
            flags: ChunkFlags::default(),
            column_heights: vec![0; COLUMN_COUNT],
            extended_heights: vec![0; EXTENDED_COLUMN_COUNT],
        }
    }

    pub fn position(&self) -> ChunkPos {
        self.position
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn generation_seed(&self) -> u32 {
        self.generation_seed
    }

    pub fn flags(&self) -> ChunkFlags {
        self.flags
    }

    pub fn is_mesh_dirty(&self) -> bool {
        self.flags.is_mesh_dirty
    }

    pub fn set_mesh_dirty(&mut self, dirty: bool) {
        self.flags.is_mesh_dirty = dirty;
    }

    pub fn is_meshing(&self) -> bool {
        self.flags.is_meshing
    }

    pub fn set_meshing(&mut self, meshing: bool) {
        self.flags.is_meshing = meshing;
    }

    pub fn voxels(&self) -> &[BlockId] {
        &self.voxels
    }

    pub fn extended_heights(&self) -> &[i32] {
        &self.extended_heights
    }

    /// Column height (world-y of the topmost solid block) within the extended `[-1, SIZE]` apron.
    pub fn extended_height_at(&self, local_x: i32, local_z: i32) -> i32 {
        self.extended_heights[extended_index(local_x, local_z)]
    }

    /// Bounds-checked read. Returns Air for any coordinate outside `[0, SIZE) x [0, HEIGHT) x
    /// [0, SIZE)`.
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        if x < 0 || x >= SIZE || y < 0 || y >= HEIGHT || z < 0 || z >= SIZE {
            return block::AIR;
        }
        self.voxels[voxel_index(x, y, z)]
    }

    /// Reads a cell that may lie up to one block outside this chunk: in-bounds coordinates read
    /// directly; coordinates one cell outside delegate to the loaded neighbor in that direction,
    /// or fall back to the terrain rule's prediction from `extended_heights` if that neighbor
    /// isn't loaded. Anything further outside returns Stone, standing in for "deep underground",
    /// which the mesher never actually samples.
    pub fn get_safe(&self, world: &World, x: i32, y: i32, z: i32) -> BlockId {
        if x >= 0 && x < SIZE && y >= 0 && y < HEIGHT && z >= 0 && z < SIZE {
            return self.get(x, y, z);
        }

        if y < 0 || y >= HEIGHT {
            return block::STONE;
        }

        let (dir, wrapped_x, wrapped_z) = match (x, z) {
            (-1, z) if (0..SIZE).contains(&z) => (FaceIndex::LEFT, SIZE - 1, z),
            (SIZE, z) if (0..SIZE).contains(&z) => (FaceIndex::RIGHT, 0, z),
            (x, -1) if (0..SIZE).contains(&x) => (FaceIndex::BACK, x, SIZE - 1),
            (x, SIZE) if (0..SIZE).contains(&x) => (FaceIndex::FRONT, x, 0),
            _ => return block::STONE,
        };

        if let Some(neighbor) = self
            .neighbors
            .get(dir.as_usize())
            .and_then(|pos| *pos)
            .and_then(|pos| world.get_chunk(pos))
        {
            return neighbor.get(wrapped_x, y, wrapped_z);
        }

        let height = self.extended_height_at(x, z);
        TerrainGen::block_at(height, y)
    }

    /// If `block` differs from the current cell, overwrites it, bumps `version`, marks this
    /// chunk dirty, and marks the boundary neighbor's mesh dirty if the edit lies on a face.
    pub fn set(&mut self, world: &mut World, x: i32, y: i32, z: i32, new_block: BlockId) {
        if x < 0 || x >= SIZE || y < 0 || y >= HEIGHT || z < 0 || z >= SIZE {
            return;
        }

        let index = voxel_index(x, y, z);
        if self.voxels[index] == new_block {
            return;
        }

        self.voxels[index] = new_block;
        self.version += 1;
        self.flags.is_dirty = true;
        self.flags.is_mesh_dirty = true;

        let mut boundary_dirs = [None; 3];
        if x == 0 {
            boundary_dirs[0] = Some(FaceIndex::LEFT);
        } else if x == SIZE - 1 {
            boundary_dirs[0] = Some(FaceIndex::RIGHT);
        }
        if y == 0 {
            boundary_dirs[1] = Some(FaceIndex::BOTTOM);
        } else if y == HEIGHT - 1 {
            boundary_dirs[1] = Some(FaceIndex::TOP);
        }
        if z == 0 {
            boundary_dirs[2] = Some(FaceIndex::BACK);
        } else if z == SIZE - 1 {
            boundary_dirs[2] = Some(FaceIndex::FRONT);
        }

        for dir in boundary_dirs.into_iter().flatten() {
            if let Some(neighbor_pos) = self.neighbors[dir.as_usize()] {
                if let Some(neighbor) = world.get_chunk_mut(neighbor_pos) {
                    neighbor.set_mesh_dirty(true);
                }
            }
        }
    }

    /// Idempotent: a no-op if already generated. Populates `extended_heights`, fills `voxels`
    /// column by column using the terrain rule, then marks the chunk generated and mesh-dirty.
    pub fn generate(&mut self, terrain_gen: &TerrainGen, seed: u32) {
        if self.flags.is_generated {
            return;
        }

        let base = self.position.as_ivec3() * IVec3::new(SIZE, HEIGHT, SIZE);

        for ex in -1..=SIZE {
            for ez in -1..=SIZE {
                let height = terrain_gen.height_at(base.x + ex, base.z + ez);
                self.extended_heights[extended_index(ex, ez)] = height;
            }
        }

        for x in 0..SIZE {
            for z in 0..SIZE {
                let height = self.extended_height_at(x, z);
                self.column_heights[(x * SIZE + z) as usize] = height;

                for y in 0..HEIGHT {
                    let world_y = base.y + y;
                    let block = TerrainGen::block_at(height, world_y);
                    self.voxels[voxel_index(x, y, z)] = block;
                }
            }
        }

        self.generation_seed = seed;
        self.flags.is_generated = true;
        self.flags.is_mesh_dirty = true;
    }

    pub fn set_neighbor(&mut self, dir: FaceIndex, other: Option<ChunkPos>) {
        self.neighbors[dir.as_usize()] = other;
    }

    pub fn get_neighbor(&self, dir: FaceIndex) -> Option<ChunkPos> {
        self.neighbors[dir.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated_chunk(seed: u32, position: ChunkPos) -> Chunk {
        let terrain_gen = TerrainGen::new(seed);
        let mut chunk = Chunk::new(position);
        chunk.generate(&terrain_gen, seed);
        chunk
    }

    #[test]
    fn generate_is_idempotent() {
        let terrain_gen = TerrainGen::new(1);
        let mut chunk = Chunk::new(ChunkPos::ZERO);
        chunk.generate(&terrain_gen, 1);
        let voxels_after_first = chunk.voxels.clone();
        let version_after_first = chunk.version;

        chunk.generate(&terrain_gen, 1);

        assert_eq!(chunk.voxels, voxels_after_first);
        assert_eq!(chunk.version, version_after_first);
    }

    #[test]
    fn set_is_a_no_op_when_writing_the_same_block() {
        let mut world = World::new(0, 8);
        let mut chunk = generated_chunk(1, ChunkPos::ZERO);
        let before = chunk.version;

        let existing = chunk.get(5, 5, 5);
        chunk.set(&mut world, 5, 5, 5, existing);

        assert_eq!(chunk.version, before);
    }

    #[test]
    fn set_increments_version_at_most_once_per_call() {
        let mut world = World::new(0, 8);
        let mut chunk = generated_chunk(1, ChunkPos::ZERO);
        let before = chunk.version;

        chunk.set(&mut world, 5, 5, 5, block::AIR);
        chunk.set(&mut world, 5, 5, 5, block::AIR);

        assert_eq!(chunk.version, before + 1);
    }

    #[test]
    fn out_of_bounds_get_returns_air() {
        let chunk = Chunk::new(ChunkPos::ZERO);
        assert_eq!(chunk.get(-1, 0, 0), block::AIR);
        assert_eq!(chunk.get(SIZE, 0, 0), block::AIR);
        assert_eq!(chunk.get(0, HEIGHT, 0), block::AIR);
    }

    #[test]
    fn chunk_pos_from_world_block_floors_negative_coordinates() {
        assert_eq!(ChunkPos::from_world_block(-1, 0, 0), ChunkPos::new(-1, 0, 0));
        assert_eq!(ChunkPos::from_world_block(-16, 0, 0), ChunkPos::new(-1, 0, 0));
        assert_eq!(ChunkPos::from_world_block(0, 0, 0), ChunkPos::new(0, 0, 0));
        assert_eq!(ChunkPos::from_world_block(15, 0, 0), ChunkPos::new(0, 0, 0));
    }

    #[test]
    fn scenario_seed_12345_chunk_origin_surface_column() {
        let chunk = generated_chunk(12345, ChunkPos::ZERO);
        let height = chunk.column_heights[0];

        assert_eq!(chunk.get(0, height - 1, 0), block::GRASS);
        assert_eq!(chunk.get(0, height - 2, 0), block::DIRT);

        if height > WATER_LEVEL_FOR_TEST {
            let above = height.max(WATER_LEVEL_FOR_TEST + 1);
            assert_eq!(chunk.get(0, above, 0), block::AIR);
        }
    }

    const WATER_LEVEL_FOR_TEST: i32 = crate::terrain_gen::WATER_LEVEL;
}
