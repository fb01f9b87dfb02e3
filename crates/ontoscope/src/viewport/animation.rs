use ontoscope_core::{geometry::Point, scheduler::CancellationToken};

/// What the viewport shows: a paper point at the viewport center and a scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub center: Point,
    pub scale: f32,
}

/// Smoothstep easing on `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Eased transition between two viewport states.
///
/// The clock starts at the first [`ViewportAnimation::sample`] call, so an
/// animation created between frames does not skip ahead.
#[derive(Debug)]
pub struct ViewportAnimation {
    from: ViewportState,
    to: ViewportState,
    duration_ms: f64,
    started_at: Option<f64>,
    token: CancellationToken,
}

impl ViewportAnimation {
    pub fn new(from: ViewportState, to: ViewportState, duration_ms: f64, token: CancellationToken) -> Self {
        Self {
            from,
            to,
            duration_ms,
            started_at: None,
            token,
        }
    }

    pub fn target(&self) -> ViewportState {
        self.to
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Viewport state at `now_ms` and whether the animation has finished.
    pub fn sample(&mut self, now_ms: f64) -> (ViewportState, bool) {
        let started_at = *self.started_at.get_or_insert(now_ms);
        let progress = if self.duration_ms <= 0.0 {
            1.0
        } else {
            ((now_ms - started_at) / self.duration_ms).clamp(0.0, 1.0)
        };
        if progress >= 1.0 {
            return (self.to, true);
        }
        let t = ease_in_out(progress as f32);
        let state = ViewportState {
            center: self.from.center.lerp(self.to.center, t),
            scale: self.from.scale + (self.to.scale - self.from.scale) * t,
        };
        (state, false)
    }
}
