//! Events module for remapper activity
//!
//! The state machine reports every side effect it triggers as a
//! [`RemapEvent`]. Events travel over a broadcast channel so the hook
//! thread never waits on a consumer.

use tokio::sync::broadcast;
use tracing::{info, warn};

/// Events emitted by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapEvent {
    /// Caps Lock tapped alone
    LanguageSwitchRequested,

    /// Caps Lock + Left Shift chord completed
    IndicatorToggled,

    /// Remapping switched on or off (Alt + Caps Lock)
    RemapToggled {
        /// New value of the feature switch
        enabled: bool,
    },
}

impl std::fmt::Display for RemapEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemapEvent::LanguageSwitchRequested => write!(f, "LANGUAGE_SWITCH_REQUESTED"),
            RemapEvent::IndicatorToggled => write!(f, "INDICATOR_TOGGLED"),
            RemapEvent::RemapToggled { enabled: true } => write!(f, "REMAP_ENABLED"),
            RemapEvent::RemapToggled { enabled: false } => write!(f, "REMAP_DISABLED"),
        }
    }
}

/// Log remap events until every sender is gone.
///
/// Returns the number of events seen.
pub async fn log_events(mut event_rx: broadcast::Receiver<RemapEvent>) -> u64 {
    let mut seen = 0;

    loop {
        match event_rx.recv().await {
            Ok(event) => {
                seen += 1;
                match event {
                    RemapEvent::RemapToggled { enabled } => {
                        info!(
                            enabled,
                            "Switchy has been {}",
                            if enabled { "enabled" } else { "disabled" }
                        );
                    }
                    _ => info!(%event, "remap event"),
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "remap event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        assert_eq!(RemapEvent::IndicatorToggled.to_string(), "INDICATOR_TOGGLED");
        assert_eq!(
            RemapEvent::RemapToggled { enabled: false }.to_string(),
            "REMAP_DISABLED"
        );
        assert_eq!(
            RemapEvent::RemapToggled { enabled: true }.to_string(),
            "REMAP_ENABLED"
        );
    }

    #[test]
    fn test_log_events_drains_until_closed() {
        let (tx, rx) = broadcast::channel(8);
        tx.send(RemapEvent::LanguageSwitchRequested).unwrap();
        tx.send(RemapEvent::RemapToggled { enabled: false }).unwrap();
        drop(tx);

        let seen = tokio_test::block_on(log_events(rx));
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn test_log_events_survives_lag() {
        let (tx, rx) = broadcast::channel(2);
        for _ in 0..5 {
            tx.send(RemapEvent::IndicatorToggled).unwrap();
        }
        drop(tx);

        // Only the newest two fit in the buffer
        assert_eq!(log_events(rx).await, 2);
    }
}
