use crate::error::EventResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use twig_vdom::EventKind;

/// Event registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Window in which a second click on the same target counts as a double click.
    /// Lone clicks are dispatched only after this window elapses.
    #[serde(default = "default_click_delay_ms")]
    pub click_delay_ms: u64,

    /// Event kinds handlers may be registered for
    #[serde(default = "default_event_kinds")]
    pub event_kinds: Vec<EventKind>,
}

fn default_click_delay_ms() -> u64 {
    300
}

fn default_event_kinds() -> Vec<EventKind> {
    vec![
        EventKind::Click,
        EventKind::DblClick,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::Scroll,
    ]
}

impl RegistryConfig {
    pub fn from_json_str(json: &str) -> EventResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    pub fn supports(&self, kind: EventKind) -> bool {
        self.event_kinds.contains(&kind)
    }

    pub fn with_click_delay(mut self, delay: Duration) -> Self {
        self.click_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_event_kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.event_kinds = kinds.into_iter().collect();
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            click_delay_ms: default_click_delay_ms(),
            event_kinds: default_event_kinds(),
        }
    }
}
