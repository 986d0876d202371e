use glam::Vec3;

use crate::{
    block::{self, BlockId},
    chunk::{Chunk, HEIGHT, SIZE},
    render::util::mesh::{MeshData, Vertex},
    terrain_gen::TerrainGen,
    util::face::{FaceIndex, FACE_NORMALS},
    world::World,
};

const VOLUME: usize = (SIZE * HEIGHT * SIZE) as usize;

/// A read-only snapshot of everything `build_mesh` needs for one chunk: its own voxels and
/// extended heights, plus a clone of each loaded neighbor's voxels. Captured on the main thread
/// before a mesh build is submitted to a worker, so the worker never touches `World` or `Chunk`
/// directly and the main thread remains free to mutate either while the build runs.
pub struct ChunkMeshInput {
    voxels: Vec<BlockId>,
    extended_heights: Vec<i32>,
    neighbor_voxels: [Option<Vec<BlockId>>; 6],
}

impl ChunkMeshInput {
    pub fn capture(chunk: &Chunk, world: &World) -> Self {
        let mut neighbor_voxels: [Option<Vec<BlockId>>; 6] = Default::default();
        for dir in FaceIndex::ALL {
            neighbor_voxels[dir.as_usize()] = chunk
                .get_neighbor(dir)
                .and_then(|pos| world.get_chunk(pos))
                .map(|neighbor| neighbor.voxels().to_vec());
        }

        Self {
            voxels: chunk.voxels().to_vec(),
            extended_heights: chunk.extended_heights().to_vec(),
            neighbor_voxels,
        }
    }

    fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        if x < 0 || x >= SIZE || y < 0 || y >= HEIGHT || z < 0 || z >= SIZE {
            return block::AIR;
        }
        self.voxels[voxel_index(x, y, z)]
    }

    /// Mirrors `Chunk::get_safe`, but against this captured snapshot instead of live chunk/world
    /// state.
    fn get_safe(&self, x: i32, y: i32, z: i32) -> BlockId {
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

        if let Some(neighbor_voxels) = &self.neighbor_voxels[dir.as_usize()] {
            return neighbor_voxels[voxel_index(wrapped_x, y, wrapped_z)];
        }

        let height = self.extended_heights[extended_index(x, z)];
        TerrainGen::block_at(height, y)
    }
}

fn voxel_index(x: i32, y: i32, z: i32) -> usize {
    ((x * HEIGHT + y) * SIZE + z) as usize
}

fn extended_index(x: i32, z: i32) -> usize {
    let extended_size = SIZE + 2;
    ((x + 1) * extended_size + (z + 1)) as usize
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub texture_id: f32,
    pub debug_flag: f32,
}

impl Vertex for ChunkVertex {
    fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32,
            4 => Float32,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

const TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const FACE_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Half-unit vertex offsets from the cell center, in canonical winding (counter-clockwise viewed
/// from outside), indexed by `FaceIndex`.
const FACE_OFFSETS: [[Vec3; 4]; 6] = [
    // front (+Z)
    [
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ],
    // back (-Z)
    [
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
    ],
    // right (+X)
    [
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(0.5, 0.5, 0.5),
    ],
    // left (-X)
    [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, -0.5),
    ],
    // top (+Y)
    [
        Vec3::new(-0.5, 0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
    ],
    // bottom (-Y)
    [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(-0.5, -0.5, 0.5),
    ],
];

/// Whether a face should be emitted between solid cell `v` and its neighbor `u` in direction
/// `dir`.
fn should_emit_face(v: BlockId, u: BlockId) -> bool {
    if v == block::WATER {
        u == block::AIR
    } else if v.is_transparent() {
        // other transparent blocks (Leaves, Glass): remove internal faces between same-type cells
        u != v
    } else {
        u.is_transparent()
    }
}

fn texture_id_for(v: BlockId, dir: FaceIndex) -> f32 {
    let props = v.properties();
    if dir == FaceIndex::TOP {
        props.texture_top
    } else if dir == FaceIndex::BOTTOM {
        props.texture_bottom
    } else {
        props.texture_sides
    }
}

/// Builds the chunk's CPU-side mesh: one call reads only the captured snapshot, so it is safe to
/// run on a worker thread while the main thread continues to mutate the live `World`.
pub fn build_mesh(input: &ChunkMeshInput) -> MeshData<ChunkVertex, u32> {
    let solid_count = input.voxels.iter().filter(|b| b.is_solid()).count();
    let vertex_capacity = (24 * solid_count).min(VOLUME / 4);

    let mut mesh = MeshData::empty();
    mesh.vertices.reserve(vertex_capacity);

    for x in 0..SIZE {
        for y in 0..HEIGHT {
            for z in 0..SIZE {
                let v = input.get(x, y, z);
                if v == block::AIR {
                    continue;
                }

                for dir in FaceIndex::ALL {
                    let normal = FACE_NORMALS[dir.as_usize()];
                    let u = input.get_safe(x + normal.x, y + normal.y, z + normal.z);

                    if !should_emit_face(v, u) {
                        continue;
                    }

                    emit_face(&mut mesh, x, y, z, dir, v);
                }
            }
        }
    }

    mesh
}

fn emit_face(
    mesh: &mut MeshData<ChunkVertex, u32>,
    x: i32,
    y: i32,
    z: i32,
    dir: FaceIndex,
    block: BlockId,
) {
    let base_index = mesh.vertices.len() as u32;
    let cell_center = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
    let normal = FACE_NORMALS[dir.as_usize()].as_vec3();
    let texture_id = texture_id_for(block, dir);

    for (offset, tex_coord) in FACE_OFFSETS[dir.as_usize()].iter().zip(TEX_COORDS) {
        mesh.vertices.push(ChunkVertex {
            position: (cell_center + *offset).to_array(),
            normal: normal.to_array(),
            tex_coord,
            texture_id,
            debug_flag: 0.0,
        });
    }

    mesh.indices
        .extend(FACE_INDICES.iter().map(|i| base_index + i));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkPos;

    fn flat_plate_input(surface_block: BlockId) -> ChunkMeshInput {
        let mut voxels = vec![block::AIR; VOLUME];
        // kept away from the chunk-local x/z boundaries (0 and SIZE-1) so every side face
        // resolves against a real Air neighbor cell instead of the apron-prediction fallback
        for x in 5..8 {
            for z in 5..8 {
                voxels[voxel_index(x, 54, z)] = block::AIR;
                voxels[voxel_index(x, 55, z)] = surface_block;
            }
        }

        ChunkMeshInput {
            voxels,
            extended_heights: vec![0; ((SIZE + 2) * (SIZE + 2)) as usize],
            neighbor_voxels: Default::default(),
        }
    }

    #[test]
    fn water_plate_emits_no_internal_faces_between_water_cells() {
        let input = flat_plate_input(block::WATER);
        let mesh = build_mesh(&input);

        // 9 top, 9 bottom, 12 side faces against Air; 6 indices per face
        assert_eq!(mesh.indices.len(), (9 + 9 + 12) * 6);
    }

    #[test]
    fn leaves_do_not_emit_faces_against_other_leaves() {
        let mut voxels = vec![block::AIR; VOLUME];
        voxels[voxel_index(0, 0, 0)] = block::LEAVES;
        voxels[voxel_index(1, 0, 0)] = block::LEAVES;

        let input = ChunkMeshInput {
            voxels,
            extended_heights: vec![0; ((SIZE + 2) * (SIZE + 2)) as usize],
            neighbor_voxels: Default::default(),
        };
        let mesh = build_mesh(&input);

        // the shared +X/-X face between the two Leaves cells must not appear
        let quad_count = mesh.indices.len() / 6;
        assert_eq!(quad_count, 6 + 6 - 2);
    }

    #[test]
    fn opaque_cell_surrounded_by_air_emits_all_six_faces() {
        let mut voxels = vec![block::AIR; VOLUME];
        voxels[voxel_index(5, 5, 5)] = block::STONE;

        let input = ChunkMeshInput {
            voxels,
            extended_heights: vec![0; ((SIZE + 2) * (SIZE + 2)) as usize],
            neighbor_voxels: Default::default(),
        };
        let mesh = build_mesh(&input);

        assert_eq!(mesh.indices.len(), 6 * 6);
    }

    #[test]
    fn chunk_pos_used_only_to_document_intent_of_capture() {
        // `ChunkMeshInput::capture` is exercised at the `World`/`Chunk` integration level; this
        // module's tests work directly against synthetic snapshots for precise face-count control.
        let _ = ChunkPos::ZERO;
    }
}
