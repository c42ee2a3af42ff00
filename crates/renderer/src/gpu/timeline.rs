use std::time::{Duration, Instant};

use crtconfig::CrtSettings;

use crate::types::CrossfadeCurve;

impl CrossfadeCurve {
    pub(crate) fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            CrossfadeCurve::Linear => clamped,
            CrossfadeCurve::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
            CrossfadeCurve::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
        }
    }
}

pub(crate) struct FadeEnvelope {
    start: Instant,
    duration: Duration,
    curve: CrossfadeCurve,
}

impl FadeEnvelope {
    pub fn new(duration: Duration, curve: CrossfadeCurve, now: Instant) -> Option<Self> {
        if duration.is_zero() {
            None
        } else {
            Some(Self {
                start: now,
                duration,
                curve,
            })
        }
    }

    /// Eased progress in `0..=1` and whether the envelope has run out.
    pub fn progress(&self, now: Instant) -> (f32, bool) {
        let elapsed = now.saturating_duration_since(self.start);
        let linear = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        (self.curve.sample(linear), linear >= 1.0)
    }
}

/// Blend between two settings bundles driven by a [`FadeEnvelope`].
pub(crate) struct SettingsFade {
    from: CrtSettings,
    to: CrtSettings,
    envelope: FadeEnvelope,
}

impl SettingsFade {
    /// `None` when the duration is zero; callers should switch immediately.
    pub fn new(
        from: CrtSettings,
        to: CrtSettings,
        duration: Duration,
        curve: CrossfadeCurve,
        now: Instant,
    ) -> Option<Self> {
        FadeEnvelope::new(duration, curve, now).map(|envelope| Self { from, to, envelope })
    }

    pub fn target(&self) -> &CrtSettings {
        &self.to
    }

    /// Settings in effect at `now`; the flag is true once the target is reached.
    pub fn sample(&self, now: Instant) -> (CrtSettings, bool) {
        let (mix, finished) = self.envelope.progress(now);
        if finished {
            (self.to, true)
        } else {
            (self.from.lerp(&self.to, mix), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crtconfig::SettingField;

    #[test]
    fn linear_curve_increases_monotonically() {
        let curve = CrossfadeCurve::Linear;
        let mut last = 0.0;
        for step in 0..=10 {
            let sample = curve.sample(step as f32 / 10.0);
            assert!(sample >= last - f32::EPSILON);
            last = sample;
        }
    }

    #[test]
    fn curves_hit_their_endpoints() {
        for curve in [
            CrossfadeCurve::Linear,
            CrossfadeCurve::Smoothstep,
            CrossfadeCurve::EaseInOut,
        ] {
            assert!(curve.sample(0.0).abs() < 1e-6, "{curve}");
            assert!((curve.sample(1.0) - 1.0).abs() < 1e-6, "{curve}");
            assert!((curve.sample(0.5) - 0.5).abs() < 1e-6, "{curve}");
        }
    }

    #[test]
    fn ease_in_out_accelerates_then_decelerates() {
        let curve = CrossfadeCurve::EaseInOut;
        assert!(curve.sample(0.25) < 0.25);
        assert!(curve.sample(0.75) > 0.75);
    }

    #[test]
    fn zero_duration_has_no_envelope() {
        let settings = CrtSettings::default();
        assert!(SettingsFade::new(
            settings,
            settings,
            Duration::ZERO,
            CrossfadeCurve::Linear,
            Instant::now()
        )
        .is_none());
    }

    #[test]
    fn settings_fade_blends_then_lands_on_target() {
        let start = Instant::now();
        let from = CrtSettings::default();
        let to = from.with(SettingField::GridOpacity, 0.85);
        let fade = SettingsFade::new(
            from,
            to,
            Duration::from_millis(100),
            CrossfadeCurve::Linear,
            start,
        )
        .expect("fade");

        let (mid, finished) = fade.sample(start + Duration::from_millis(50));
        assert!(!finished);
        assert!((mid.grid_opacity - 0.45).abs() < 0.02);
        assert!((mid.screen_zoom - from.screen_zoom).abs() < 1e-6);

        let (end, finished) = fade.sample(start + Duration::from_millis(150));
        assert!(finished);
        assert_eq!(end, to);
        assert_eq!(fade.target(), &to);
    }
}
