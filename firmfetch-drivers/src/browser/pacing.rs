use firmfetch_config::TimingConfig;
use std::time::Duration;
use tokio::time::sleep;

/// Named waits between browser interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After navigating to a page.
    PageLoad,
    /// Before touching the OS filter.
    PreSelect,
    /// After opening the OS dropdown.
    DropdownOpen,
    /// After scrolling an option into view.
    ScrollSettle,
    /// After clicking an option, while the listing reloads.
    Reload,
    /// Between two targets.
    BetweenTargets,
}

#[derive(Debug, Clone)]
/// Fixed-delay policy; the site gives no reliable readiness signal so we wait.
pub struct Pacer {
    timing: TimingConfig,
}

impl Pacer {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// A pacer that never sleeps.
    pub fn instant() -> Self {
        Self::new(TimingConfig::zero())
    }

    pub fn duration(&self, pause: Pause) -> Duration {
        let ms = match pause {
            Pause::PageLoad => self.timing.page_load,
            Pause::PreSelect => self.timing.pre_select,
            Pause::DropdownOpen => self.timing.dropdown_open,
            Pause::ScrollSettle => self.timing.scroll_settle,
            Pause::Reload => self.timing.reload,
            Pause::BetweenTargets => self.timing.between_targets,
        };
        Duration::from_millis(ms)
    }

    /// Per-probe budget used when waiting for elements to appear.
    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.timing.element_wait)
    }

    pub async fn pause(&self, pause: Pause) {
        let d = self.duration(pause);
        if d.is_zero() {
            return;
        }
        tracing::trace!(target: "browser.pacing", ?pause, ms = d.as_millis() as u64, "waiting");
        sleep(d).await;
    }
}
