//! Performance measurement tools.

use std::{
    cell::Cell,
    fmt,
    time::{Duration, Instant},
};

/// A timer that measures and averages the time an operation takes.
///
/// Collected timings are averaged and reset when the timer is displayed using `{}`
/// ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    count: Cell<u32>,
    total: Cell<Duration>,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            count: Cell::new(0),
            total: Cell::new(Duration::ZERO),
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&mut self, timee: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        timee()
    }

    /// Starts timing an operation using a drop guard.
    ///
    /// When the returned [`TimerGuard`] is dropped, the time between the call to `start` and the
    /// drop is recorded.
    pub fn start(&mut self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn record(&mut self, duration: Duration) {
        self.count.set(self.count.get().saturating_add(1));
        self.total.set(self.total.get().saturating_add(duration));
    }

    fn take_average(&self) -> (u32, Option<Duration>) {
        let count = self.count.replace(0);
        let total = self.total.replace(Duration::ZERO);
        let avg = (count > 0).then(|| total / count);
        (count, avg)
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.take_average() {
            (count, Some(avg)) => {
                let avg_ms = avg.as_secs_f32() * 1000.0;
                write!(f, "{}: {count}x{avg_ms:.01}ms", self.name)
            }
            (_, None) => write!(f, "{}: -", self.name),
        }
    }
}

/// Guard returned by [`Timer::start`]. Stops timing the operation when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a mut Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Logs frames per second with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1 and logs FPS if one second has passed.
    pub fn tick(&mut self) {
        self.tick_with(std::iter::empty::<&str>());
    }

    /// Advances the frame counter by 1 and logs FPS and `extra` data if one second has passed.
    ///
    /// `extra` is only formatted when a log line is actually written, so [`Timer`]s passed here
    /// are reset once per second.
    pub fn tick_with<D: fmt::Display, I: IntoIterator<Item = D>>(&mut self, extra: I) {
        self.frames += 1;
        if self.start.elapsed() > Duration::from_secs(1) {
            let extra = extra.into_iter().map(|d| d.to_string()).collect::<Vec<_>>();
            if extra.is_empty() {
                log::debug!("{}: {} FPS", self.name, self.frames);
            } else {
                log::debug!("{}: {} FPS ({})", self.name, self.frames, extra.join(", "));
            }

            self.frames = 0;
            self.start = Instant::now();
        }
    }

    /// Number of frames counted in the current one-second window.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_resets_average() {
        let mut timer = Timer::new("classify");
        assert_eq!(timer.to_string(), "classify: -");

        let v = timer.time(|| 7);
        assert_eq!(v, 7);
        drop(timer.start());
        assert!(timer.to_string().starts_with("classify: 2x"));
        assert_eq!(timer.to_string(), "classify: -");
    }

    #[test]
    fn fps_counter_counts_frames() {
        let mut fps = FpsCounter::new("frames");
        fps.tick();
        fps.tick_with(["extra"]);
        assert_eq!(fps.frames(), 2);
    }
}
