//! Full-screen break overlay lifecycle across all displays

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::suggestions::{random_suggestion, BreakSuggestion};
use crate::{
    services::displays::DisplayInfo,
    state::settings::{OverlayColor, OVERLAY_DURATION_RANGE},
    tasks::ticker::{TickHandle, TickTarget, Ticker},
};

pub const FADE_IN_MS: u32 = 500;

/// Why an overlay went away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    Timeout,
    Button,
    Escape,
    BackgroundClick,
    Snooze,
    Replaced,
    Shutdown,
}

/// Foreground controls drawn on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayControl {
    DismissButton,
    SnoozeButton,
}

/// Raw input captured by an overlay panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayInput {
    Key { escape: bool },
    BackgroundClick,
    ControlClick { control: OverlayControl },
}

/// What the engine must do in response to overlay input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Dismiss(DismissReason),
    Snooze,
}

/// One borderless, always-on-top, input-capturing panel bound to a display.
/// Panels are kept and reused across shows, never destroyed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPanel {
    pub display: DisplayInfo,
    pub visible: bool,
    pub alpha: f32,
    pub always_on_top: bool,
    pub joins_all_desktops: bool,
    pub captures_input: bool,
}

impl OverlayPanel {
    fn new(display: DisplayInfo) -> Self {
        Self {
            display,
            visible: false,
            alpha: 0.0,
            always_on_top: true,
            joins_all_desktops: true,
            captures_input: true,
        }
    }
}

/// Everything a presentation layer needs to draw a freshly shown overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayShown {
    pub displays: Vec<String>,
    pub countdown: u32,
    pub suggestion: BreakSuggestion,
    pub color: OverlayColor,
    pub fade_in_ms: u32,
}

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Counting(u32),
    Expired,
}

#[derive(Debug)]
pub struct OverlayLifecycle {
    panels: Vec<OverlayPanel>,
    visible: bool,
    remaining: u32,
    suggestion: Option<BreakSuggestion>,
    key_interceptor: bool,
    ticker: Ticker,
    countdown: Option<TickHandle>,
    generation: u64,
}

impl OverlayLifecycle {
    pub fn new(ticker: Ticker) -> Self {
        Self {
            panels: Vec::new(),
            visible: false,
            remaining: 0,
            suggestion: None,
            key_interceptor: false,
            ticker,
            countdown: None,
            generation: 0,
        }
    }

    /// Show the overlay on every display, replacing any overlay already up
    pub fn trigger<R: Rng + ?Sized>(
        &mut self,
        displays: &[DisplayInfo],
        duration_seconds: u32,
        color: OverlayColor,
        rng: &mut R,
    ) -> OverlayShown {
        if self.visible {
            self.hide_immediately();
        }

        for screen in displays {
            let panel = match self.panels.iter().position(|p| p.display.id == screen.id) {
                Some(index) => &mut self.panels[index],
                None => {
                    debug!("Creating overlay panel for display {}", screen.id);
                    self.panels.push(OverlayPanel::new(screen.clone()));
                    let last = self.panels.len() - 1;
                    &mut self.panels[last]
                }
            };
            panel.display = screen.clone();
            panel.visible = true;
            panel.alpha = 1.0;
        }

        let duration = duration_seconds.clamp(OVERLAY_DURATION_RANGE.0, OVERLAY_DURATION_RANGE.1);
        let suggestion = random_suggestion(rng);

        self.visible = true;
        self.remaining = duration;
        self.suggestion = Some(suggestion);
        self.key_interceptor = true;
        self.generation += 1;
        self.countdown = Some(self.ticker.arm(TickTarget::OverlayCountdown, self.generation));

        info!(
            "Break overlay shown on {} display(s) for {}s: {}",
            displays.len(),
            duration,
            suggestion.title
        );

        OverlayShown {
            displays: displays.iter().map(|d| d.id.clone()).collect(),
            countdown: duration,
            suggestion,
            color,
            fade_in_ms: FADE_IN_MS,
        }
    }

    /// Advance the shared countdown by one second. Ticks from a cancelled
    /// countdown, or arriving while hidden, are ignored.
    pub fn on_countdown_tick(&mut self, generation: u64) -> Option<CountdownTick> {
        if !self.visible || !self.is_current_tick(generation) {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.dismiss(DismissReason::Timeout);
            return Some(CountdownTick::Expired);
        }
        Some(CountdownTick::Counting(self.remaining))
    }

    /// Cancel the countdown, fade every panel out and hide it.
    /// Returns false when nothing was showing.
    pub fn dismiss(&mut self, reason: DismissReason) -> bool {
        if !self.visible {
            return false;
        }

        self.countdown = None;
        self.key_interceptor = false;
        for panel in self.panels.iter_mut().filter(|p| p.visible) {
            panel.alpha = 0.0;
            panel.visible = false;
        }
        self.visible = false;
        info!("Break overlay dismissed ({:?})", reason);
        true
    }

    /// Map captured input to an action. Escape and background clicks dismiss;
    /// clicks on controls never count as background clicks.
    pub fn handle_input(&self, input: OverlayInput) -> Option<OverlayAction> {
        if !self.visible {
            return None;
        }
        match input {
            OverlayInput::Key { escape: true } if self.key_interceptor => {
                Some(OverlayAction::Dismiss(DismissReason::Escape))
            }
            OverlayInput::Key { .. } => None,
            OverlayInput::BackgroundClick => Some(OverlayAction::Dismiss(DismissReason::BackgroundClick)),
            OverlayInput::ControlClick { control: OverlayControl::DismissButton } => {
                Some(OverlayAction::Dismiss(DismissReason::Button))
            }
            OverlayInput::ControlClick { control: OverlayControl::SnoozeButton } => Some(OverlayAction::Snooze),
        }
    }

    fn hide_immediately(&mut self) {
        self.countdown = None;
        self.key_interceptor = false;
        for panel in &mut self.panels {
            panel.alpha = 0.0;
            panel.visible = false;
        }
        self.visible = false;
        debug!("Previous overlay hidden without fade");
    }

    fn is_current_tick(&self, generation: u64) -> bool {
        self.countdown
            .as_ref()
            .is_some_and(|countdown| countdown.generation() == generation)
    }

    /// Generation of the live countdown, if one is armed
    pub fn countdown_generation(&self) -> Option<u64> {
        self.countdown.as_ref().map(TickHandle::generation)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn remaining(&self) -> u32 {
        if self.visible {
            self.remaining
        } else {
            0
        }
    }

    pub fn suggestion(&self) -> Option<BreakSuggestion> {
        self.suggestion.filter(|_| self.visible)
    }

    pub fn panels(&self) -> &[OverlayPanel] {
        &self.panels
    }

    pub fn visible_panels(&self) -> usize {
        self.panels.iter().filter(|p| p.visible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn displays(n: usize) -> Vec<DisplayInfo> {
        (0..n)
            .map(|i| DisplayInfo::new(format!("DP-{}", i), 1920, 1080, 1920 * i as i32, 0, i == 0))
            .collect()
    }

    fn lifecycle() -> (OverlayLifecycle, StdRng) {
        (OverlayLifecycle::new(Ticker::detached()), StdRng::seed_from_u64(7))
    }

    fn tick(overlay: &mut OverlayLifecycle) -> Option<CountdownTick> {
        let generation = overlay.countdown_generation()?;
        overlay.on_countdown_tick(generation)
    }

    #[test]
    fn shows_one_panel_per_display() {
        let (mut overlay, mut rng) = lifecycle();
        let shown = overlay.trigger(&displays(3), 10, OverlayColor::Teal, &mut rng);
        assert_eq!(shown.displays, vec!["DP-0", "DP-1", "DP-2"]);
        assert_eq!(shown.countdown, 10);
        assert_eq!(overlay.visible_panels(), 3);
        assert!(overlay.panels().iter().all(|p| p.always_on_top && p.joins_all_desktops));
    }

    #[test]
    fn retrigger_replaces_instead_of_stacking() {
        let (mut overlay, mut rng) = lifecycle();
        overlay.trigger(&displays(2), 10, OverlayColor::Blue, &mut rng);
        let old = overlay.countdown_generation().unwrap();
        overlay.trigger(&displays(2), 10, OverlayColor::Blue, &mut rng);

        assert_eq!(overlay.panels().len(), 2);
        assert_eq!(overlay.visible_panels(), 2);
        assert_eq!(overlay.on_countdown_tick(old), None);
    }

    #[test]
    fn panels_are_reused_after_dismiss() {
        let (mut overlay, mut rng) = lifecycle();
        overlay.trigger(&displays(2), 10, OverlayColor::Blue, &mut rng);
        overlay.dismiss(DismissReason::Button);
        assert_eq!(overlay.panels().len(), 2);
        assert_eq!(overlay.visible_panels(), 0);

        overlay.trigger(&displays(1), 10, OverlayColor::Blue, &mut rng);
        assert_eq!(overlay.panels().len(), 2);
        assert_eq!(overlay.visible_panels(), 1);
    }

    #[test]
    fn countdown_expires_exactly_once() {
        let (mut overlay, mut rng) = lifecycle();
        overlay.trigger(&displays(1), 10, OverlayColor::Blue, &mut rng);
        let generation = overlay.countdown_generation().unwrap();

        for expected in (1..10).rev() {
            assert_eq!(tick(&mut overlay), Some(CountdownTick::Counting(expected)));
        }
        assert_eq!(tick(&mut overlay), Some(CountdownTick::Expired));
        assert!(!overlay.is_visible());
        assert_eq!(overlay.remaining(), 0);
        assert_eq!(overlay.on_countdown_tick(generation), None);
    }

    #[test]
    fn duration_is_clamped() {
        let (mut overlay, mut rng) = lifecycle();
        assert_eq!(overlay.trigger(&displays(1), 1, OverlayColor::Blue, &mut rng).countdown, 5);
        assert_eq!(overlay.trigger(&displays(1), 900, OverlayColor::Blue, &mut rng).countdown, 300);
    }

    #[test]
    fn dismiss_cancels_countdown_and_is_idempotent() {
        let (mut overlay, mut rng) = lifecycle();
        overlay.trigger(&displays(1), 10, OverlayColor::Blue, &mut rng);
        let generation = overlay.countdown_generation().unwrap();
        assert!(overlay.dismiss(DismissReason::Escape));
        assert!(!overlay.dismiss(DismissReason::Escape));
        assert_eq!(overlay.countdown_generation(), None);
        assert_eq!(overlay.on_countdown_tick(generation), None);
    }

    #[test]
    fn input_mapping() {
        let (mut overlay, mut rng) = lifecycle();
        assert_eq!(overlay.handle_input(OverlayInput::BackgroundClick), None);

        overlay.trigger(&displays(1), 10, OverlayColor::Blue, &mut rng);
        assert_eq!(
            overlay.handle_input(OverlayInput::Key { escape: true }),
            Some(OverlayAction::Dismiss(DismissReason::Escape))
        );
        assert_eq!(overlay.handle_input(OverlayInput::Key { escape: false }), None);
        assert_eq!(
            overlay.handle_input(OverlayInput::BackgroundClick),
            Some(OverlayAction::Dismiss(DismissReason::BackgroundClick))
        );
        assert_eq!(
            overlay.handle_input(OverlayInput::ControlClick { control: OverlayControl::DismissButton }),
            Some(OverlayAction::Dismiss(DismissReason::Button))
        );
        assert_eq!(
            overlay.handle_input(OverlayInput::ControlClick { control: OverlayControl::SnoozeButton }),
            Some(OverlayAction::Snooze)
        );
    }
}
