use std::{
    collections::HashMap,
    sync::mpsc::{self, Receiver, Sender},
};

use glam::Vec3;

use crate::{
    block::BlockId,
    chunk::{Chunk, ChunkPos, HEIGHT, SIZE},
    core::tasks::{TaskPriority, Tasks},
    terrain_gen::TerrainGen,
    util::face::FaceIndex,
};

/// Hard ceiling on vertical chunk coordinate: chunks are never created above this, giving a
/// fixed world height of `(WORLD_MAX_CHUNK_Y + 1) * HEIGHT`.
pub const WORLD_MAX_CHUNK_Y: i32 = 7;

/// Distance beyond the render distance a loaded chunk must drift before it's evicted, to avoid
/// rapid load/unload cycling at the boundary.
const UNLOAD_HYSTERESIS: f32 = 1.5;

/// Maximum number of chunk-load results applied to the world in a single `update` call.
const LOADS_PER_FRAME: usize = 2;

/// Priority class used for all background chunk generation tasks.
const CHUNK_GENERATION_PRIORITY: i32 = 0;

/// The sparse, chunked voxel store. Chunks are streamed in and out around a moving center;
/// generation of newly-requested chunks happens on background worker threads and is applied to
/// the map a bounded number of chunks per frame.
pub struct World {
    chunks: HashMap<ChunkPos, Chunk>,
    world_seed: u32,
    render_distance: i32,
    last_center_chunk: Option<ChunkPos>,
    loaded_chunk_tx: Sender<Chunk>,
    loaded_chunk_rx: Receiver<Chunk>,
    /// Chunk positions for which a generation task has been submitted but not yet returned.
    pending_loads: std::collections::HashSet<ChunkPos>,
}

impl World {
    pub fn new(world_seed: u32, render_distance: i32) -> Self {
        let (loaded_chunk_tx, loaded_chunk_rx) = mpsc::channel();

        Self {
            chunks: HashMap::new(),
            world_seed,
            render_distance,
            last_center_chunk: None,
            loaded_chunk_tx,
            loaded_chunk_rx,
            pending_loads: std::collections::HashSet::new(),
        }
    }

    pub fn world_seed(&self) -> u32 {
        self.world_seed
    }

    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    pub fn get_chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn get_chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Voxel read by world-block coordinates; absent chunks return Air via `Chunk::get`'s
    /// out-of-bounds rule applied to a phantom chunk (no chunk means no solid block here).
    pub fn get_block(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockId {
        let chunk_pos = ChunkPos::from_world_block(world_x, world_y, world_z);
        let Some(chunk) = self.get_chunk(chunk_pos) else {
            return crate::block::AIR;
        };
        let (lx, ly, lz) = local_coords(world_x, world_y, world_z);
        chunk.get(lx, ly, lz)
    }

    /// Creates-or-fetches the owning chunk and delegates to `Chunk::set`.
    pub fn set_block(&mut self, world_x: i32, world_y: i32, world_z: i32, block: BlockId) {
        let chunk_pos = ChunkPos::from_world_block(world_x, world_y, world_z);
        let (lx, ly, lz) = local_coords(world_x, world_y, world_z);

        if !self.chunks.contains_key(&chunk_pos) {
            let terrain_gen = TerrainGen::new(self.world_seed);
            let mut chunk = Chunk::new(chunk_pos);
            chunk.generate(&terrain_gen, self.world_seed);
            self.insert_generated_chunk(chunk);
        }

        let mut chunk = self
            .chunks
            .remove(&chunk_pos)
            .expect("chunk was just inserted");
        chunk.set(self, lx, ly, lz, block);
        self.chunks.insert(chunk_pos, chunk);
    }

    /// Called once per frame with the streaming center (typically the camera position).
    pub fn update(&mut self, tasks: &mut Tasks, center_position: Vec3) {
        for _ in 0..LOADS_PER_FRAME {
            let Ok(chunk) = self.loaded_chunk_rx.try_recv() else {
                break;
            };
            self.pending_loads.remove(&chunk.position());
            self.insert_generated_chunk(chunk);
        }

        let center_chunk = ChunkPos::from_world_block(
            center_position.x as i32,
            center_position.y as i32,
            center_position.z as i32,
        );

        if self.last_center_chunk == Some(center_chunk) {
            return;
        }
        self.last_center_chunk = Some(center_chunk);

        let desired = self.desired_chunks(center_chunk);

        let mut loads_applied = 0;
        for (chunk_pos, _distance) in &desired {
            if loads_applied >= LOADS_PER_FRAME {
                break;
            }
            if self.chunks.contains_key(chunk_pos) || self.pending_loads.contains(chunk_pos) {
                continue;
            }
            self.submit_load(tasks, *chunk_pos, center_position);
            loads_applied += 1;
        }

        let desired_set: std::collections::HashSet<ChunkPos> =
            desired.iter().map(|(pos, _)| *pos).collect();
        let unload_distance = self.render_distance as f32 + UNLOAD_HYSTERESIS;

        let to_unload: Vec<ChunkPos> = self
            .chunks
            .keys()
            .copied()
            .filter(|pos| {
                !desired_set.contains(pos)
                    && weighted_distance(*pos, center_chunk) > unload_distance
            })
            .collect();

        for pos in to_unload {
            self.unload_chunk(pos);
        }
    }

    /// All chunk positions within the configured render distance, with `y` capped to
    /// `[0, WORLD_MAX_CHUNK_Y]`, ordered nearest-first.
    fn desired_chunks(&self, center_chunk: ChunkPos) -> Vec<(ChunkPos, f32)> {
        let r = self.render_distance;
        let center = center_chunk.as_ivec3();

        let y_min = (center.y - 2).max(0);
        let y_max = (center.y + 2).min(WORLD_MAX_CHUNK_Y);

        let mut result = Vec::new();
        for x in (center.x - r)..=(center.x + r) {
            for z in (center.z - r)..=(center.z + r) {
                for y in y_min..=y_max {
                    let pos = ChunkPos::new(x, y, z);
                    let distance = weighted_distance(pos, center_chunk);
                    if distance <= r as f32 {
                        result.push((pos, distance));
                    }
                }
            }
        }

        result.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        result
    }

    fn submit_load(&mut self, tasks: &mut Tasks, chunk_pos: ChunkPos, center_position: Vec3) {
        self.pending_loads.insert(chunk_pos);

        let world_seed = self.world_seed;
        let loaded_chunk_tx = self.loaded_chunk_tx.clone();
        let priority_within_class =
            Vec3::distance_squared(chunk_pos.as_vec3(), center_position / SIZE as f32) as i32;

        tasks.submit(
            TaskPriority {
                class_priority: CHUNK_GENERATION_PRIORITY,
                priority_within_class,
            },
            move || {
                let terrain_gen = TerrainGen::new(world_seed);
                let mut chunk = Chunk::new(chunk_pos);
                chunk.generate(&terrain_gen, world_seed);
                if let Err(e) = loaded_chunk_tx.send(chunk) {
                    log::trace!("loaded chunk dropped, world no longer listening: {}", e);
                }
            },
        );
    }

    /// Adds a freshly generated chunk to the map and links it to any already-loaded neighbors,
    /// setting the reciprocal back-reference on each.
    fn insert_generated_chunk(&mut self, mut chunk: Chunk) {
        let pos = chunk.position();

        for dir in FaceIndex::ALL {
            let neighbor_pos = pos.offset(dir);
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_pos) {
                chunk.set_neighbor(dir, Some(neighbor_pos));
                neighbor.set_neighbor(dir.opposite(), Some(pos));
                neighbor.set_mesh_dirty(true);
            }
        }

        self.chunks.insert(pos, chunk);
    }

    /// Nulls out the reciprocal back-reference on every loaded neighbor before dropping
    /// ownership of the chunk itself.
    fn unload_chunk(&mut self, pos: ChunkPos) {
        for dir in FaceIndex::ALL {
            let neighbor_pos = pos.offset(dir);
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_pos) {
                neighbor.set_neighbor(dir.opposite(), None);
            }
        }

        self.chunks.remove(&pos);
    }
}

fn local_coords(world_x: i32, world_y: i32, world_z: i32) -> (i32, i32, i32) {
    (
        world_x.rem_euclid(SIZE),
        world_y.rem_euclid(HEIGHT),
        world_z.rem_euclid(SIZE),
    )
}

fn weighted_distance(pos: ChunkPos, center: ChunkPos) -> f32 {
    let delta = pos.as_ivec3() - center.as_ivec3();
    ((delta.x * delta.x) as f32 + 0.25 * (delta.y * delta.y) as f32 + (delta.z * delta.z) as f32)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_block_on_unloaded_chunk_is_air() {
        let world = World::new(1, 4);
        assert_eq!(world.get_block(0, 0, 0), crate::block::AIR);
    }

    #[test]
    fn set_block_creates_and_generates_the_owning_chunk() {
        let mut world = World::new(1, 4);
        world.set_block(0, 0, 0, crate::block::IRON);
        assert_eq!(world.get_block(0, 0, 0), crate::block::IRON);
        assert!(world.get_chunk(ChunkPos::ZERO).unwrap().flags().is_generated);
    }

    #[test]
    fn neighbor_link_reciprocity_after_inserting_two_adjacent_chunks() {
        let mut world = World::new(1, 4);
        let terrain_gen = TerrainGen::new(1);

        let mut a = Chunk::new(ChunkPos::new(0, 0, 0));
        a.generate(&terrain_gen, 1);
        world.insert_generated_chunk(a);

        let mut b = Chunk::new(ChunkPos::new(1, 0, 0));
        b.generate(&terrain_gen, 1);
        world.insert_generated_chunk(b);

        let a = world.get_chunk(ChunkPos::new(0, 0, 0)).unwrap();
        let b = world.get_chunk(ChunkPos::new(1, 0, 0)).unwrap();

        assert_eq!(a.get_neighbor(FaceIndex::RIGHT), Some(ChunkPos::new(1, 0, 0)));
        assert_eq!(b.get_neighbor(FaceIndex::LEFT), Some(ChunkPos::new(0, 0, 0)));
    }

    #[test]
    fn edit_on_boundary_cell_marks_neighbor_mesh_dirty() {
        let mut world = World::new(1, 4);
        let terrain_gen = TerrainGen::new(1);

        let mut a = Chunk::new(ChunkPos::new(0, 0, 0));
        a.generate(&terrain_gen, 1);
        world.insert_generated_chunk(a);

        let mut b = Chunk::new(ChunkPos::new(1, 0, 0));
        b.generate(&terrain_gen, 1);
        world.insert_generated_chunk(b);
        world.get_chunk_mut(ChunkPos::new(1, 0, 0)).unwrap().set_mesh_dirty(false);

        // (15, 10, 5) is on the +X boundary of chunk (0,0,0), bordering chunk (1,0,0)
        world.set_block(15, 10, 5, crate::block::AIR);

        assert!(world.get_chunk(ChunkPos::new(0, 0, 0)).unwrap().is_mesh_dirty());
        assert!(world.get_chunk(ChunkPos::new(1, 0, 0)).unwrap().is_mesh_dirty());
    }

    #[test]
    fn desired_chunks_are_ordered_nearest_first() {
        let world = World::new(1, 4);
        let desired = world.desired_chunks(ChunkPos::ZERO);
        for pair in desired.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn streaming_never_thrashes_a_chunk_within_one_update() {
        let mut world = World::new(1, 4);
        let mut tasks = Tasks::new(2);

        world.update(&mut tasks, Vec3::ZERO);
        tasks.block_until_finished();
        world.update(&mut tasks, Vec3::ZERO);

        let loaded_near_origin = world.chunks.contains_key(&ChunkPos::ZERO);
        assert!(loaded_near_origin);

        world.update(&mut tasks, Vec3::new(6.0 * SIZE as f32, 0.0, 0.0));
        tasks.block_until_finished();
        world.update(&mut tasks, Vec3::new(6.0 * SIZE as f32, 0.0, 0.0));

        assert!(!world.chunks.contains_key(&ChunkPos::ZERO));
    }
}
