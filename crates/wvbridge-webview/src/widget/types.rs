use wvbridge_config::{BridgeConfig, EvaluationPolicy, PendingUrlPolicy};

/// Where a widget is in its native lifecycle.
///
/// `Uninitialized -> Attaching -> Attached -> Closed`. `Closed` is
/// terminal; a failed attach returns to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Attaching = 1,
    Attached = 2,
    Closed = 3,
}

impl LifecycleState {
    pub(super) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Attaching,
            2 => Self::Attached,
            _ => Self::Closed,
        }
    }
}

/// Per-widget behavior knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetSettings {
    pub pending_url: PendingUrlPolicy,
    pub navigation_policy: EvaluationPolicy,
}

impl WidgetSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            pending_url: config.widget.pending_url,
            navigation_policy: config.navigation.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = BridgeConfig::default();
        config.widget.pending_url = PendingUrlPolicy::Reject;
        config.navigation.policy = EvaluationPolicy::ShortCircuit;

        let settings = WidgetSettings::from_config(&config);
        assert_eq!(settings.pending_url, PendingUrlPolicy::Reject);
        assert_eq!(settings.navigation_policy, EvaluationPolicy::ShortCircuit);
    }

    #[test]
    fn default_settings_match_default_config() {
        assert_eq!(
            WidgetSettings::default(),
            WidgetSettings::from_config(&BridgeConfig::default())
        );
    }

    #[test]
    fn state_survives_atomic_encoding() {
        for state in [
            LifecycleState::Uninitialized,
            LifecycleState::Attaching,
            LifecycleState::Attached,
            LifecycleState::Closed,
        ] {
            assert_eq!(LifecycleState::from_u8(state as u8), state);
        }
    }
}
