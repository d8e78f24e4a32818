use web_time::{Duration, Instant};

/// Frame pacing with a smoothed FPS readout.
pub struct FrameTiming {
    /// Target FPS (0 = unlimited)
    target_fps: u32,
    /// Minimum frame duration based on target FPS
    min_frame_duration: Duration,
    /// Last frame timestamp
    last_frame: Instant,
    /// Seconds between the last two frames
    last_dt: f32,
    /// Smoothed FPS using exponential moving average
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0)
    smoothing: f32,
}

impl FrameTiming {
    /// Create a new frame timer with the given FPS target (0 = unlimited).
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps,
            min_frame_duration: min_frame_duration(target_fps),
            last_frame: Instant::now(),
            last_dt: 0.0,
            smoothed_fps: target_fps.max(1) as f32,
            smoothing: 0.05,
        }
    }

    /// True once a full frame interval has passed since the last frame.
    pub fn should_render(&self) -> bool {
        if self.target_fps == 0 {
            return true;
        }
        self.last_frame.elapsed() >= self.min_frame_duration
    }

    /// Time left until the next frame is due.
    pub fn time_until_next_frame(&self) -> Duration {
        self.min_frame_duration
            .saturating_sub(self.last_frame.elapsed())
    }

    /// Mark a frame as rendered. Returns the seconds since the previous
    /// frame.
    pub fn end_frame(&mut self) -> f32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.last_dt = frame_time;
        self.record(frame_time);
        frame_time
    }

    fn record(&mut self, frame_time: f32) {
        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
    }

    /// Seconds between the last two frames.
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    /// Get the current FPS (smoothed)
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

fn min_frame_duration(target_fps: u32) -> Duration {
    if target_fps > 0 {
        Duration::from_secs_f64(1.0 / f64::from(target_fps))
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_fps_interval() {
        let d = min_frame_duration(60);
        assert!((d.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(min_frame_duration(0), Duration::ZERO);
    }

    #[test]
    fn unlimited_always_renders() {
        let timing = FrameTiming::new(0);
        assert!(timing.should_render());
        assert_eq!(timing.time_until_next_frame(), Duration::ZERO);
    }

    #[test]
    fn smoothing_moves_toward_instant_fps() {
        let mut timing = FrameTiming::new(60);
        let start = timing.fps();
        timing.record(1.0 / 30.0);
        assert!(timing.fps() < start);
        assert!(timing.fps() > 30.0);
    }
}
