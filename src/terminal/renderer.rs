//! Terminal progress presentation (spec §4.16, C16). Implements
//! `DagObserver` so the orchestrator can drive it directly, plus a small set
//! of round-event methods the pipeline calls as rounds complete. Grounded on
//! the teacher's `bin/cli/output/mod.rs` spinner (`indicatif::ProgressBar`)
//! and `display.rs`'s emoji/`owo_colors` texture; CI mode falls back to the
//! same one-line-per-event style the teacher uses for its CI summary writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::core::errors::HandoverError;

const REPAINT_THROTTLE: Duration = Duration::from_millis(60);

/// Whether the process is attached to an interactive terminal and color is
/// wanted. `NO_COLOR` (https://no-color.org) and a non-TTY stdout both
/// force the plain/CI path (spec §4.16).
fn tty_mode() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::env::var_os("CI").is_none() && Term::stdout().is_term()
}

/// One step/round's current display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    Pending,
    Running,
    Complete,
    Degraded,
    Failed,
    Skipped,
}

impl StepState {
    fn symbol(&self, color: bool) -> &'static str {
        match (self, color) {
            (Self::Pending, _) => "○",
            (Self::Running, _) => "◐",
            (Self::Complete, true) => "✓",
            (Self::Complete, false) => "[ok]",
            (Self::Degraded, true) => "◑",
            (Self::Degraded, false) => "[degraded]",
            (Self::Failed, true) => "✗",
            (Self::Failed, false) => "[failed]",
            (Self::Skipped, _) => "[skipped]",
        }
    }
}

struct TrackedStep {
    id: String,
    bar: Option<ProgressBar>,
    state: StepState,
}

/// Dual-mode progress display: a bounded, throttled in-place repaint of a
/// `MultiProgress` tree under a TTY, or one structured log line per state
/// transition when stdout is not a terminal, `CI` is set, or `NO_COLOR` is
/// set (spec §4.16).
pub struct TerminalRenderer {
    tty: bool,
    color: bool,
    multi: Option<MultiProgress>,
    steps: Mutex<Vec<TrackedStep>>,
    last_repaint: Mutex<Instant>,
    cost_visible: AtomicBool,
}

impl TerminalRenderer {
    /// `show_cost` is false for local providers and subscription auth, where
    /// a dollar estimate would be meaningless (spec §4.16).
    pub fn new(show_cost: bool) -> Self {
        let tty = tty_mode();
        Self {
            tty,
            color: tty,
            multi: if tty { Some(MultiProgress::new()) } else { None },
            steps: Mutex::new(Vec::new()),
            last_repaint: Mutex::new(Instant::now() - REPAINT_THROTTLE),
            cost_visible: AtomicBool::new(show_cost),
        }
    }

    fn log_line(&self, id: &str, state: StepState, detail: Option<&str>) {
        let symbol = state.symbol(false);
        match detail {
            Some(detail) => println!("{symbol} {id}: {detail}"),
            None => println!("{symbol} {id}"),
        }
    }

    fn ensure_step(&self, id: &str) -> usize {
        let mut steps = self.steps.lock().unwrap();
        if let Some(pos) = steps.iter().position(|s| s.id == id) {
            return pos;
        }

        let bar = self.multi.as_ref().map(|multi| {
            let bar = multi.add(ProgressBar::new_spinner());
            if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_message(format!("{id}: pending"));
            bar
        });

        steps.push(TrackedStep { id: id.to_string(), bar, state: StepState::Pending });
        steps.len() - 1
    }

    fn set_state(&self, id: &str, state: StepState, detail: Option<String>) {
        let idx = self.ensure_step(id);
        let mut steps = self.steps.lock().unwrap();
        steps[idx].state = state;

        if let Some(bar) = &steps[idx].bar {
            let symbol = state.symbol(self.color);
            let message = match &detail {
                Some(detail) => format!("{symbol} {id}: {detail}"),
                None => format!("{symbol} {id}"),
            };
            bar.set_message(message);
            if matches!(state, StepState::Complete | StepState::Degraded | StepState::Failed | StepState::Skipped) {
                bar.finish();
            }
            drop(steps);
            self.throttled_repaint();
        } else {
            drop(steps);
            self.log_line(id, state, detail.as_deref());
        }
    }

    fn throttled_repaint(&self) {
        let mut last = self.last_repaint.lock().unwrap();
        if last.elapsed() >= REPAINT_THROTTLE {
            *last = Instant::now();
        }
    }

    pub fn on_round_start(&self, round: u8) {
        self.set_state(&format!("round-{round}"), StepState::Running, None);
    }

    pub fn on_round_complete(&self, round: u8, input_tokens: usize, output_tokens: usize, cost: Option<f64>) {
        let detail = self.format_usage(input_tokens, output_tokens, cost);
        self.set_state(&format!("round-{round}"), StepState::Complete, Some(detail));
    }

    pub fn on_round_degraded(&self, round: u8, reason: &str) {
        self.set_state(&format!("round-{round}"), StepState::Degraded, Some(reason.to_string()));
    }

    /// A round satisfied from `RoundCache` never calls the provider (spec §8
    /// scenario 5: "the terminal records status cached").
    pub fn on_round_cached(&self, round: u8) {
        self.set_state(&format!("round-{round}"), StepState::Complete, Some("cached".to_string()));
    }

    fn format_usage(&self, input_tokens: usize, output_tokens: usize, cost: Option<f64>) -> String {
        let tokens = format!("{input_tokens} in / {output_tokens} out");
        if self.cost_visible.load(Ordering::Relaxed) {
            match cost {
                Some(cost) => format!("{tokens}, ${cost:.4}"),
                None => tokens,
            }
        } else {
            tokens
        }
    }

    /// Renders a final one-line-per-document summary (spec §4.16: progress
    /// display ends with a completion summary, not a silent exit).
    pub fn finish(&self, documents_written: usize, total_cost: Option<f64>) {
        if let Some(multi) = &self.multi {
            let _ = multi.clear();
        }

        let banner = if self.color { "done".green().to_string() } else { "done".to_string() };

        match (self.cost_visible.load(Ordering::Relaxed), total_cost) {
            (true, Some(cost)) => println!("{banner}: {documents_written} documents written, est. cost ${cost:.4}"),
            _ => println!("{banner}: {documents_written} documents written"),
        }
    }
}

impl crate::dag::orchestrator::DagObserver for TerminalRenderer {
    fn on_step_start(&self, id: &str) {
        self.set_state(id, StepState::Running, None);
    }

    fn on_step_complete(&self, id: &str) {
        self.set_state(id, StepState::Complete, None);
    }

    fn on_step_fail(&self, id: &str, error: &HandoverError) {
        self.set_state(id, StepState::Failed, Some(error.to_string()));
    }

    fn on_step_skip(&self, id: &str) {
        self.set_state(id, StepState::Skipped, Some("upstream failure".to_string()));
    }

    fn on_step_retry(&self, id: &str, attempt: u32, delay_ms: u64, reason: &str) {
        self.set_state(id, StepState::Running, Some(format!("retry {attempt} in {delay_ms}ms ({reason})")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_symbols_differ_between_color_and_plain() {
        assert_ne!(StepState::Complete.symbol(true), StepState::Complete.symbol(false));
    }

    #[test]
    fn usage_string_omits_cost_when_not_visible() {
        let renderer = TerminalRenderer::new(false);
        let usage = renderer.format_usage(100, 50, Some(1.23));
        assert!(!usage.contains('$'));
        assert!(usage.contains("100 in"));
    }

    #[test]
    fn usage_string_includes_cost_when_visible() {
        let renderer = TerminalRenderer::new(true);
        let usage = renderer.format_usage(100, 50, Some(1.23));
        assert!(usage.contains('$'));
    }
}
