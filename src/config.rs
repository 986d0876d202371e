/// Recognized configuration options for the engine, per the external interface contract.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Seed driving all terrain generation
    pub world_seed: u32,
    /// Render/load distance in chunk units
    pub render_distance: i32,
    /// Number of worker threads used for background mesh building
    pub worker_count: usize,
    /// Rate at which the water texture animation advances, in frames per second
    pub water_animation_fps: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            world_seed: 0,
            render_distance: 12,
            worker_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            water_animation_fps: 16.0,
        }
    }
}
