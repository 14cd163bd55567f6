use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use surfpatch::engine::progress::{Progress, ProgressCallback};
use tracing::warn;

const TICK: Duration = Duration::from_millis(80);

/// Unit outcomes seen during the current phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    scored: usize,
    failed: usize,
}

struct BarState {
    bar: ProgressBar,
    phase: &'static str,
    tally: Tally,
}

impl BarState {
    fn status(&self) -> String {
        match self.tally {
            Tally { scored: 0, failed: 0 } => self.phase.to_string(),
            Tally { scored, failed: 0 } => format!("{} ({scored} scored)", self.phase),
            Tally { scored, failed } => {
                format!("{} ({scored} scored, {failed} failed)", self.phase)
            }
        }
    }

    fn handle(&mut self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                self.phase = name;
                self.tally = Tally::default();
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.set_message(name);
                self.bar.enable_steady_tick(TICK);
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_style(bar_style());
                self.bar.set_length(total_steps);
                self.bar.set_message(self.status());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
                self.bar.finish();
            }
            Progress::UnitFinished {
                unit,
                patches,
                stop_reason,
            } => {
                self.tally.scored += 1;
                self.bar.set_message(self.status());
                self.bar
                    .println(format!("  ✓ {unit}: {patches} patch(es), {stop_reason}"));
            }
            Progress::UnitFailed { unit, reason } => {
                self.tally.failed += 1;
                self.bar.set_message(self.status());
                self.bar.println(format!("  ✗ {unit}: {reason}"));
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let summary = match self.tally {
                    Tally { failed: 0, .. } => "✓ Done".to_string(),
                    Tally { failed, .. } => format!("✓ Done, {failed} unit(s) failed"),
                };
                self.bar.finish_with_message(summary);
            }
            Progress::Message(text) if self.bar.is_finished() => self.bar.set_message(text),
            Progress::Message(text) => self.bar.println(format!("  {text}")),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<32} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Draws workflow progress on stderr and keeps a per-phase count of unit outcomes.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        Self {
            display: Arc::new(Mutex::new(BarState {
                bar,
                phase: "",
                tally: Tally::default(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = Arc::clone(&self.display);
        Box::new(move |event: Progress| match display.lock() {
            Ok(mut display) => display.handle(event),
            Err(_) => warn!("Progress display lock was poisoned; dropping event."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfpatch::engine::state::{StopReason, UnitId};

    fn unit(chain: char, domain: usize) -> UnitId {
        UnitId { chain, domain }
    }

    #[test]
    fn fresh_handler_has_no_tally() {
        let handler = CliProgressHandler::hidden();
        let display = handler.display.lock().unwrap();
        assert_eq!(display.tally, Tally::default());
        assert_eq!(display.bar.length(), Some(0));
    }

    #[test]
    fn bar_follows_task_steps() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Scoring Units",
        });
        callback(Progress::TaskStart { total_steps: 4 });
        callback(Progress::TaskIncrement);
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.bar.length(), Some(4));
            assert_eq!(display.bar.position(), 1);
            assert_eq!(display.bar.message(), "Scoring Units");
        }

        callback(Progress::TaskFinish);
        assert_eq!(handler.display.lock().unwrap().bar.position(), 4);
    }

    #[test]
    fn unit_outcomes_are_counted_and_summarised() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Scoring Units",
        });
        callback(Progress::TaskStart { total_steps: 3 });
        callback(Progress::UnitFinished {
            unit: unit('A', 1),
            patches: 2,
            stop_reason: StopReason::EmptyGraph,
        });
        callback(Progress::UnitFinished {
            unit: unit('A', 2),
            patches: 1,
            stop_reason: StopReason::IterationLimit,
        });
        assert_eq!(
            handler.display.lock().unwrap().bar.message(),
            "Scoring Units (2 scored)"
        );

        callback(Progress::UnitFailed {
            unit: unit('B', 1),
            reason: "too few atoms".to_string(),
        });
        assert_eq!(
            handler.display.lock().unwrap().bar.message(),
            "Scoring Units (2 scored, 1 failed)"
        );

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        let display = handler.display.lock().unwrap();
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.message(), "✓ Done, 1 unit(s) failed");
    }

    #[test]
    fn new_phase_resets_the_tally() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Domain Splitting",
        });
        callback(Progress::UnitFailed {
            unit: unit('A', 1),
            reason: "bad".to_string(),
        });
        callback(Progress::PhaseStart {
            name: "Scoring Units",
        });
        callback(Progress::PhaseFinish);

        let display = handler.display.lock().unwrap();
        assert_eq!(display.tally, Tally::default());
        assert_eq!(display.bar.message(), "✓ Done");
    }

    #[test]
    fn callback_can_be_shared_across_threads() {
        let handler = CliProgressHandler::hidden();
        let callback = Arc::new(handler.get_callback());

        std::thread::scope(|scope| {
            for i in 0..4 {
                let callback = Arc::clone(&callback);
                scope.spawn(move || {
                    callback(Progress::UnitFinished {
                        unit: unit('A', i + 1),
                        patches: 0,
                        stop_reason: StopReason::EmptyGraph,
                    });
                });
            }
        });

        assert_eq!(handler.display.lock().unwrap().tally.scored, 4);
    }
}
