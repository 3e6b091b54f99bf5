/// Simulation loop timing and control
///
/// Implements a fixed timestep loop with variable rendering: the simulation always
/// advances in steps of `1 / rate` seconds, however irregular the frames are.
use std::time::{Duration, Instant};

/// Default simulation rate (updates per second)
pub const DEFAULT_UPDATE_RATE: u32 = 30;

/// Maximum number of simulation steps per frame to prevent spiral of death
const MAX_STEPS_PER_FRAME: u32 = 5;

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

/// Loop timing state
pub struct GameLoop {
    /// Length of one simulation step
    timestep: Duration,

    /// Accumulated time for fixed timestep updates
    accumulator: Duration,

    /// Time of last frame
    last_frame_time: Instant,

    /// Whether the simulation is paused
    paused: bool,

    /// Frame timing history for FPS calculation
    frame_times: Vec<Duration>,

    /// Current frame number
    frame_count: u64,

    /// Total updates executed
    update_count: u64,

    /// Current FPS (updated periodically)
    current_fps: f32,
}

impl GameLoop {
    /// Create a loop running `updates_per_second` fixed steps (at least one)
    pub fn new(updates_per_second: u32) -> Self {
        let rate = updates_per_second.max(1);
        Self {
            timestep: Duration::from_secs_f64(1.0 / rate as f64),
            accumulator: Duration::ZERO,
            last_frame_time: Instant::now(),
            paused: false,
            frame_times: Vec::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            update_count: 0,
            current_fps: 0.0,
        }
    }

    /// Begin a new frame, returns the number of fixed updates to run
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;
        self.advance(frame_time)
    }

    /// Account for `frame_time` of elapsed time, returns the number of updates to run
    ///
    /// Used directly when time is simulated rather than measured.
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.frame_count += 1;

        self.frame_times.push(frame_time);
        if self.frame_times.len() > FPS_WINDOW_SIZE {
            self.frame_times.remove(0);
        }

        // Update FPS counter every 10 frames
        if self.frame_count % 10 == 0 {
            self.update_fps();
        }

        // If paused, don't accumulate time for updates
        if self.paused {
            return 0;
        }

        self.accumulator += frame_time;

        let mut updates = 0;
        while self.accumulator >= self.timestep && updates < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.timestep;
            updates += 1;
        }

        // Drop whatever the cap left behind instead of replaying it next frame
        if updates == MAX_STEPS_PER_FRAME {
            self.accumulator = Duration::ZERO;
        }

        self.update_count += updates as u64;
        updates
    }

    /// Get the fixed timestep (in seconds)
    pub fn fixed_timestep(&self) -> f32 {
        self.timestep.as_secs_f32()
    }

    /// Get current FPS
    pub fn fps(&self) -> f32 {
        self.current_fps
    }

    /// Get total number of frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get total number of updates executed
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Check if the simulation is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused");
        }
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Reset accumulator to prevent update burst
            self.accumulator = Duration::ZERO;
            log::info!("Simulation resumed");
        }
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Update FPS calculation
    fn update_fps(&mut self) {
        if self.frame_times.is_empty() {
            self.current_fps = 0.0;
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total / self.frame_times.len() as u32;

        self.current_fps = if avg_frame_time.as_secs_f32() > 0.0 {
            1.0 / avg_frame_time.as_secs_f32()
        } else {
            0.0
        };
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    #[test]
    fn test_game_loop_creation() {
        let game_loop = GameLoop::default();
        assert_eq!(game_loop.frame_count(), 0);
        assert_eq!(game_loop.update_count(), 0);
        assert!(!game_loop.is_paused());
    }

    #[test]
    fn test_fixed_timestep() {
        assert_relative_eq!(GameLoop::new(30).fixed_timestep(), 1.0 / 30.0, epsilon = 1e-6);
        assert_relative_eq!(GameLoop::new(60).fixed_timestep(), 1.0 / 60.0, epsilon = 1e-6);
        // A zero rate is clamped rather than dividing by zero
        assert_relative_eq!(GameLoop::new(0).fixed_timestep(), 1.0);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut game_loop = GameLoop::new(10);

        assert_eq!(game_loop.advance(Duration::from_millis(50)), 0);
        assert_eq!(game_loop.advance(Duration::from_millis(50)), 1);
        assert_eq!(game_loop.advance(Duration::from_millis(250)), 2);
        assert_eq!(game_loop.update_count(), 3);
    }

    #[test]
    fn test_max_steps_limit() {
        let mut game_loop = GameLoop::new(30);

        // 2 seconds would allow 60 updates
        assert_eq!(game_loop.advance(Duration::from_secs(2)), MAX_STEPS_PER_FRAME);
        // The backlog is dropped, not replayed
        assert_eq!(game_loop.advance(Duration::ZERO), 0);
    }

    #[test]
    fn test_pause_resume() {
        let mut game_loop = GameLoop::default();

        game_loop.pause();
        assert!(game_loop.is_paused());
        assert_eq!(game_loop.advance(Duration::from_secs(1)), 0);

        game_loop.resume();
        assert!(!game_loop.is_paused());
    }

    #[test]
    fn test_toggle_pause() {
        let mut game_loop = GameLoop::default();

        game_loop.toggle_pause();
        assert!(game_loop.is_paused());

        game_loop.toggle_pause();
        assert!(!game_loop.is_paused());
    }

    #[test]
    fn test_frame_counting() {
        let mut game_loop = GameLoop::default();

        game_loop.begin_frame();
        assert_eq!(game_loop.frame_count(), 1);

        game_loop.begin_frame();
        assert_eq!(game_loop.frame_count(), 2);
    }

    #[test]
    fn test_measured_frame_time() {
        let mut game_loop = GameLoop::new(100);
        thread::sleep(Duration::from_millis(30));

        let updates = game_loop.begin_frame();
        assert!(updates >= 1 && updates <= MAX_STEPS_PER_FRAME);
    }

    #[test]
    fn test_fps_estimate() {
        let mut game_loop = GameLoop::default();
        for _ in 0..10 {
            game_loop.advance(Duration::from_millis(20));
        }
        assert_relative_eq!(game_loop.fps(), 50.0, epsilon = 0.01);
    }
}
