use std::fmt;

pub(crate) const STUDY_MINUTES_RANGE: (u32, u32) = (1, 120);
pub(crate) const BREAK_MINUTES_RANGE: (u32, u32) = (1, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

impl TimerState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Running => "In progress",
            Self::Paused => "Paused",
            Self::Expired => "Finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Study,
    Break,
}

impl Phase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Study => "Study session",
            Self::Break => "Break time",
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Study => Self::Break,
            Self::Break => Self::Study,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerSettings {
    study_minutes: u32,
    break_minutes: u32,
}

impl TimerSettings {
    /// Out-of-range values are clamped rather than rejected.
    pub(crate) fn new(study_minutes: u32, break_minutes: u32) -> Self {
        Self {
            study_minutes: study_minutes.clamp(STUDY_MINUTES_RANGE.0, STUDY_MINUTES_RANGE.1),
            break_minutes: break_minutes.clamp(BREAK_MINUTES_RANGE.0, BREAK_MINUTES_RANGE.1),
        }
    }

    pub(crate) fn study_minutes(&self) -> u32 {
        self.study_minutes
    }

    pub(crate) fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Study => self.study_minutes,
            Phase::Break => self.break_minutes,
        }
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self::new(25, 5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerMode {
    /// A one-off countdown that stays expired until reset.
    Countdown { total_secs: u32 },
    /// Alternates study and break phases, re-arming after each one.
    StudyBreak(TimerSettings),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    Expired(Phase),
}

type CompletionCallback = Box<dyn FnMut(Phase) + Send>;

pub(crate) struct CountdownTimer {
    mode: TimerMode,
    phase: Phase,
    state: TimerState,
    minutes: u32,
    seconds: u32,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("remaining", &self.display())
            .finish_non_exhaustive()
    }
}

impl CountdownTimer {
    pub(crate) fn study_break(settings: TimerSettings) -> Self {
        Self {
            mode: TimerMode::StudyBreak(settings),
            phase: Phase::Study,
            state: TimerState::Idle,
            minutes: settings.study_minutes,
            seconds: 0,
            on_complete: None,
        }
    }

    pub(crate) fn countdown_secs(total_secs: u32) -> Self {
        Self {
            mode: TimerMode::Countdown { total_secs },
            phase: Phase::Study,
            state: TimerState::Idle,
            minutes: total_secs / 60,
            seconds: total_secs % 60,
            on_complete: None,
        }
    }

    pub(crate) fn with_completion<F>(mut self, callback: F) -> Self
    where
        F: FnMut(Phase) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub(crate) fn state(&self) -> TimerState {
        self.state
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub(crate) fn settings(&self) -> Option<TimerSettings> {
        match self.mode {
            TimerMode::StudyBreak(settings) => Some(settings),
            TimerMode::Countdown { .. } => None,
        }
    }

    pub(crate) fn remaining_secs(&self) -> u32 {
        self.minutes * 60 + self.seconds
    }

    pub(crate) fn display(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }

    /// Fraction of the current phase already elapsed, in `[0, 1]`.
    pub(crate) fn elapsed_ratio(&self) -> f64 {
        let total = self.phase_total_secs();
        if total == 0 {
            return 1.0;
        }
        let elapsed = total.saturating_sub(self.remaining_secs());
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub(crate) fn start(&mut self) {
        if matches!(self.state, TimerState::Idle | TimerState::Paused) {
            self.state = TimerState::Running;
        }
    }

    pub(crate) fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    pub(crate) fn toggle(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Back to `Idle` with the configured duration. A study/break timer also
    /// returns to the study phase.
    pub(crate) fn reset(&mut self) {
        self.phase = Phase::Study;
        self.state = TimerState::Idle;
        self.load_phase_duration();
    }

    /// Replaces the study/break durations, stops the timer and reloads the
    /// current phase. Ignored for a plain countdown.
    pub(crate) fn apply_settings(&mut self, settings: TimerSettings) {
        if let TimerMode::StudyBreak(current) = &mut self.mode {
            *current = settings;
            self.state = TimerState::Idle;
            self.load_phase_duration();
        }
    }

    /// Advances one second. Does nothing unless running.
    pub(crate) fn tick(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }

        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        }

        if self.remaining_secs() > 0 {
            return None;
        }
        Some(self.expire())
    }

    fn expire(&mut self) -> TimerEvent {
        let finished = self.phase;
        self.state = TimerState::Expired;
        if let Some(callback) = self.on_complete.as_mut() {
            callback(finished);
        }

        if matches!(self.mode, TimerMode::StudyBreak(_)) {
            self.phase = finished.other();
            self.load_phase_duration();
            self.state = TimerState::Idle;
        }
        TimerEvent::Expired(finished)
    }

    fn phase_total_secs(&self) -> u32 {
        match self.mode {
            TimerMode::Countdown { total_secs } => total_secs,
            TimerMode::StudyBreak(settings) => settings.minutes_for(self.phase) * 60,
        }
    }

    fn load_phase_duration(&mut self) {
        let total = self.phase_total_secs();
        self.minutes = total / 60;
        self.seconds = total % 60;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn settings_are_clamped() {
        let settings = TimerSettings::new(0, 500);
        assert_eq!(settings.study_minutes(), 1);
        assert_eq!(settings.break_minutes(), 60);
        assert_eq!(TimerSettings::new(200, 0).study_minutes(), 120);
    }

    #[test]
    fn tick_borrows_a_minute_on_second_underflow() {
        let mut timer = CountdownTimer::study_break(TimerSettings::new(2, 1));
        timer.start();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.display(), "01:59");
    }

    #[test]
    fn ticks_are_ignored_unless_running() {
        let mut timer = CountdownTimer::countdown_secs(3);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), 3);

        timer.start();
        timer.tick();
        timer.pause();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), 2);
        assert_eq!(timer.state(), TimerState::Paused);
    }

    #[test]
    fn pause_and_start_only_apply_to_valid_states() {
        let mut timer = CountdownTimer::countdown_secs(10);
        timer.pause();
        assert_eq!(timer.state(), TimerState::Idle);
        timer.start();
        timer.start();
        assert_eq!(timer.state(), TimerState::Running);
        timer.toggle();
        assert_eq!(timer.state(), TimerState::Paused);
        timer.toggle();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn expired_countdown_stays_expired_until_reset() {
        let mut timer = CountdownTimer::countdown_secs(1);
        timer.start();
        assert_eq!(timer.tick(), Some(TimerEvent::Expired(Phase::Study)));
        timer.start();
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.tick(), None);

        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_secs(), 1);
    }

    #[test]
    fn study_phase_rolls_over_into_idle_break() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        let mut timer = CountdownTimer::study_break(TimerSettings::new(1, 3))
            .with_completion(move |_| {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            });

        timer.start();
        let events: Vec<_> = (0..60).filter_map(|_| timer.tick()).collect();

        assert_eq!(events, vec![TimerEvent::Expired(Phase::Study)]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.display(), "03:00");
    }

    #[test]
    fn break_phase_rolls_back_to_study() {
        let mut timer = CountdownTimer::study_break(TimerSettings::new(1, 1));
        timer.start();
        for _ in 0..60 {
            timer.tick();
        }
        timer.start();
        let last = (0..60).filter_map(|_| timer.tick()).last();
        assert_eq!(last, Some(TimerEvent::Expired(Phase::Break)));
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.display(), "01:00");
    }

    #[test]
    fn reset_returns_to_study_phase() {
        let mut timer = CountdownTimer::study_break(TimerSettings::new(1, 5));
        timer.start();
        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(timer.phase(), Phase::Break);
        timer.reset();
        assert_eq!(timer.phase(), Phase::Study);
        assert_eq!(timer.display(), "01:00");
    }

    #[test]
    fn apply_settings_stops_and_reloads_current_phase() {
        let mut timer = CountdownTimer::study_break(TimerSettings::default());
        timer.start();
        timer.tick();
        timer.apply_settings(TimerSettings::new(50, 10));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.display(), "50:00");
        assert!((timer.elapsed_ratio() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn elapsed_ratio_tracks_progress() {
        let mut timer = CountdownTimer::countdown_secs(4);
        timer.start();
        timer.tick();
        assert!((timer.elapsed_ratio() - 0.25).abs() < 1e-9);
    }
}
