//! Timeline events and the sequence-mode cue that emits them.

/// Timing payload attached to every cue event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CueInfo {
    /// Cue start, in scene time.
    pub start_time: f64,
    /// Cue end, in scene time.
    pub end_time: f64,
    /// Scene time of this event.
    pub animation_time: f64,
    /// Scene time elapsed since the previous event.
    pub delta_time: f64,
}

/// Event delivered by an animation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CueEvent {
    Start(CueInfo),
    Tick(CueInfo),
    End(CueInfo),
}

impl CueEvent {
    pub fn info(&self) -> &CueInfo {
        match self {
            CueEvent::Start(info) | CueEvent::Tick(info) | CueEvent::End(info) => info,
        }
    }
}

/// Sequence-mode animation cue.
///
/// Emits one `Start`, a `Tick` at `start_time + k / frame_rate` for every
/// such time not past `end_time`, and one `End`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationCue {
    pub start_time: f64,
    pub end_time: f64,
    /// Ticks per unit of scene time.
    pub frame_rate: f64,
}

impl AnimationCue {
    pub fn new(start_time: f64, end_time: f64, frame_rate: f64) -> Self {
        Self {
            start_time,
            end_time,
            frame_rate,
        }
    }

    /// Cue that ticks exactly once per element of an `n`-element sequence.
    pub fn for_frames(n: usize, frame_rate: f64) -> Self {
        let span = n.saturating_sub(1) as f64 / frame_rate;
        Self::new(0.0, span, frame_rate)
    }

    /// Number of `Tick` events the cue will emit, saturating at `u64::MAX`.
    pub fn tick_count(&self) -> u64 {
        if self.frame_rate.is_nan() || self.frame_rate <= 0.0 || self.end_time < self.start_time {
            return 0;
        }
        // Tolerate rounding in (end - start) * rate landing just below an integer
        let steps = ((self.end_time - self.start_time) * self.frame_rate + 1e-9).floor();
        (steps as u64).saturating_add(1)
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Iterate the full event stream.
    pub fn events(&self) -> CueEvents {
        CueEvents {
            cue: *self,
            ticks: self.tick_count(),
            phase: Phase::Start,
        }
    }

    fn info_at(&self, animation_time: f64, delta_time: f64) -> CueInfo {
        CueInfo {
            start_time: self.start_time,
            end_time: self.end_time,
            animation_time,
            delta_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Start,
    Tick(u64),
    End,
    Done,
}

/// Iterator over the events of an [`AnimationCue`].
#[derive(Debug, Clone)]
pub struct CueEvents {
    cue: AnimationCue,
    ticks: u64,
    phase: Phase,
}

impl Iterator for CueEvents {
    type Item = CueEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let cue = &self.cue;
        match self.phase {
            Phase::Start => {
                self.phase = if self.ticks > 0 {
                    Phase::Tick(0)
                } else {
                    Phase::End
                };
                Some(CueEvent::Start(cue.info_at(cue.start_time, 0.0)))
            }
            Phase::Tick(k) => {
                self.phase = if k + 1 < self.ticks {
                    Phase::Tick(k + 1)
                } else {
                    Phase::End
                };
                let time = cue.start_time + k as f64 / cue.frame_rate;
                let delta = if k == 0 { 0.0 } else { 1.0 / cue.frame_rate };
                Some(CueEvent::Tick(cue.info_at(time, delta)))
            }
            Phase::End => {
                self.phase = Phase::Done;
                Some(CueEvent::End(cue.info_at(cue.end_time, 0.0)))
            }
            Phase::Done => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.phase {
            Phase::Start => self.ticks.saturating_add(2),
            Phase::Tick(k) => (self.ticks - k).saturating_add(1),
            Phase::End => 1,
            Phase::Done => 0,
        };
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CueEvents {}
