//! État de l'écran de chargement.

use std::time::Duration;

use engine::{Timeline, frame_duration};

pub const FAILURE_TEXT: &str = "Loading failed, please restart";

pub fn status_text(percent: f32) -> &'static str {
    if percent < 30.0 {
        "Initializing..."
    } else if percent < 70.0 {
        "Loading models..."
    } else if percent < 95.0 {
        "Preparing scene..."
    } else {
        "Almost done..."
    }
}

pub struct LoadingScreen {
    percent: f32,
    failed: bool,
    visible: bool,
    timeline: Timeline<()>,
    hide_pending: bool,
}

impl Default for LoadingScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingScreen {
    const HIDE_DELAY: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self {
            percent: 0.0,
            failed: false,
            visible: true,
            timeline: Timeline::new(),
            hide_pending: false,
        }
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn text(&self) -> &'static str {
        if self.failed {
            FAILURE_TEXT
        } else {
            status_text(self.percent)
        }
    }

    pub fn on_progress(&mut self, percent: f32) {
        self.percent = percent.clamp(self.percent, 100.0);
        if self.percent >= 100.0 && !self.hide_pending && !self.failed {
            self.hide_pending = true;
            self.timeline.schedule_in(Self::HIDE_DELAY, ());
        }
    }

    /// L'écran reste affiché avec le message d'échec.
    pub fn on_failed(&mut self) {
        self.failed = true;
        self.visible = true;
        self.timeline.clear();
    }

    pub fn advance(&mut self, dt: f32) {
        self.timeline.advance(frame_duration(dt));
        while self.timeline.pop_due().is_some() {
            self.visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_thresholds() {
        assert_eq!(status_text(0.0), "Initializing...");
        assert_eq!(status_text(29.9), "Initializing...");
        assert_eq!(status_text(30.0), "Loading models...");
        assert_eq!(status_text(70.0), "Preparing scene...");
        assert_eq!(status_text(95.0), "Almost done...");
        assert_eq!(status_text(100.0), "Almost done...");
    }

    #[test]
    fn hides_half_a_second_after_completion() {
        let mut screen = LoadingScreen::new();
        screen.on_progress(40.0);
        screen.advance(2.0);
        assert!(screen.is_visible());

        screen.on_progress(100.0);
        screen.advance(0.4);
        assert!(screen.is_visible());
        screen.advance(0.11);
        assert!(!screen.is_visible());
    }

    #[test]
    fn progress_never_goes_back() {
        let mut screen = LoadingScreen::new();
        screen.on_progress(50.0);
        screen.on_progress(20.0);
        assert_eq!(screen.percent(), 50.0);
    }

    #[test]
    fn failure_keeps_the_screen_with_its_message() {
        let mut screen = LoadingScreen::new();
        screen.on_progress(100.0);
        screen.on_failed();
        screen.advance(1.0);
        assert!(screen.is_visible());
        assert_eq!(screen.text(), FAILURE_TEXT);
    }
}
