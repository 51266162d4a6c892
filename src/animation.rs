const FRAME_THRESHOLD: f32 = 100.0;
const CLOCK_STEP: f32 = 8.0;

pub const WALK_FRAMES: usize = 6;
pub const WALK_SPEED: f32 = 2.0;
pub const DECORATION_FRAMES: usize = 4;
pub const DECORATION_SPEED: f32 = 5.0;

/// Frame counter for a horizontal strip of sprite frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    frames: usize,
    speed: f32,
    index: usize,
    clock: f32,
}

impl Animation {
    pub fn new(frames: usize, speed: f32) -> Self {
        Self {
            frames: frames.max(1),
            speed,
            index: 0,
            clock: 0.0,
        }
    }

    pub fn walking() -> Self {
        Self::new(WALK_FRAMES, WALK_SPEED)
    }

    pub fn decoration() -> Self {
        Self::new(DECORATION_FRAMES, DECORATION_SPEED)
    }

    pub fn tick(&mut self) {
        self.clock += self.speed * CLOCK_STEP;
        if self.clock >= FRAME_THRESHOLD {
            self.index = (self.index + 1) % self.frames;
            self.clock = 0.0;
        }
    }

    pub fn frame(&self) -> usize {
        self.index
    }
}
