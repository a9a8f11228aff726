use crate::core::{FrameRGBA, FrameSequence};
use crate::error::JitterResult;

/// Host-side display target the scheduler blits frames onto.
pub trait DisplaySurface {
    fn present(&mut self, frame: &FrameRGBA) -> JitterResult<()>;
}

/// Fixed-cadence playback over a frame loop, driven by a host-supplied
/// per-tick callback carrying a monotonic timestamp.
///
/// The scheduler owns only `frame_index` and `last_draw_ms`; the clock is
/// whatever `now_ms` the host passes in. `last_draw_ms` starts at 0, so the
/// first tick draws as soon as the host clock is past one interval (with
/// wall-ish monotonic timestamps: immediately). Restart via [`reset`] or
/// [`set_interval`] whenever the sequence identity or the cadence changes.
///
/// [`reset`]: PlaybackScheduler::reset
/// [`set_interval`]: PlaybackScheduler::set_interval
#[derive(Clone, Debug)]
pub struct PlaybackScheduler {
    interval_ms: u64,
    frame_index: usize,
    last_draw_ms: u64,
}

impl PlaybackScheduler {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            frame_index: 0,
            last_draw_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Restart playback from the first frame.
    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.last_draw_ms = 0;
    }

    /// Change the cadence; any change restarts playback.
    pub fn set_interval(&mut self, interval_ms: u64) {
        if self.interval_ms != interval_ms {
            self.interval_ms = interval_ms;
            self.reset();
        }
    }

    /// One cooperative tick. Draws the current frame when more than one
    /// interval has elapsed since the last draw, then advances modulo the
    /// sequence length. Returns whether a frame was presented; the host
    /// always requests the next tick regardless.
    pub fn tick(
        &mut self,
        now_ms: u64,
        frames: &FrameSequence,
        surface: &mut dyn DisplaySurface,
    ) -> JitterResult<bool> {
        if frames.is_empty() {
            return Ok(false);
        }
        if now_ms.saturating_sub(self.last_draw_ms) <= self.interval_ms {
            return Ok(false);
        }

        let index = self.frame_index % frames.len();
        if let Some(frame) = frames.get(index) {
            surface.present(frame)?;
        }
        self.frame_index = (index + 1) % frames.len();
        self.last_draw_ms = now_ms;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSurface {
        presented: Vec<u8>,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self {
                presented: Vec::new(),
            }
        }
    }

    impl DisplaySurface for RecordingSurface {
        fn present(&mut self, frame: &FrameRGBA) -> JitterResult<()> {
            // Frames in these tests are 1x1 with a distinct red byte.
            self.presented.push(frame.data[0]);
            Ok(())
        }
    }

    fn loop_of(tags: &[u8]) -> FrameSequence {
        let frames = tags
            .iter()
            .map(|&t| FrameRGBA {
                width: 1,
                height: 1,
                data: vec![t, 0, 0, 255],
            })
            .collect();
        FrameSequence::new(frames).unwrap()
    }

    #[test]
    fn first_tick_draws_once_past_one_interval() {
        let frames = loop_of(&[0, 1]);
        let mut sched = PlaybackScheduler::new(100);
        let mut surface = RecordingSurface::new();

        // Host clock well past the interval: draws immediately.
        assert!(sched.tick(500, &frames, &mut surface).unwrap());
        assert_eq!(surface.presented, vec![0]);
    }

    #[test]
    fn cadence_gates_draws_and_wraps_the_loop() {
        let frames = loop_of(&[0, 1]);
        let mut sched = PlaybackScheduler::new(100);
        let mut surface = RecordingSurface::new();

        assert!(sched.tick(500, &frames, &mut surface).unwrap());
        // Not enough elapsed: exactly one interval does not redraw ('>').
        assert!(!sched.tick(550, &frames, &mut surface).unwrap());
        assert!(!sched.tick(600, &frames, &mut surface).unwrap());
        // Past the interval again: next frame.
        assert!(sched.tick(601, &frames, &mut surface).unwrap());
        // And wrap back to frame 0.
        assert!(sched.tick(710, &frames, &mut surface).unwrap());
        assert_eq!(surface.presented, vec![0, 1, 0]);
    }

    #[test]
    fn reset_restarts_from_frame_zero() {
        let frames = loop_of(&[0, 1, 2]);
        let mut sched = PlaybackScheduler::new(10);
        let mut surface = RecordingSurface::new();

        sched.tick(100, &frames, &mut surface).unwrap();
        sched.tick(200, &frames, &mut surface).unwrap();
        assert_eq!(sched.frame_index(), 2);

        sched.reset();
        assert_eq!(sched.frame_index(), 0);
        // last_draw_ms is 0 again, so an early timestamp draws right away.
        assert!(sched.tick(11, &frames, &mut surface).unwrap());
        assert_eq!(surface.presented, vec![0, 1, 0]);
    }

    #[test]
    fn interval_change_restarts_playback() {
        let frames = loop_of(&[0, 1]);
        let mut sched = PlaybackScheduler::new(10);
        let mut surface = RecordingSurface::new();

        sched.tick(100, &frames, &mut surface).unwrap();
        sched.set_interval(50);
        assert_eq!(sched.frame_index(), 0);

        // Same interval is a no-op, state kept.
        sched.tick(200, &frames, &mut surface).unwrap();
        let before = sched.frame_index();
        sched.set_interval(50);
        assert_eq!(sched.frame_index(), before);
    }

    #[test]
    fn empty_sequence_never_draws() {
        let mut sched = PlaybackScheduler::new(10);
        let mut surface = RecordingSurface::new();
        assert!(!sched.tick(1000, &FrameSequence::empty(), &mut surface).unwrap());
        assert!(surface.presented.is_empty());
    }
}
