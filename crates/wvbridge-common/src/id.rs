use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag attached to every log line a widget emits.
///
/// Random 32 bits taken from a v4 uuid, shown as 8 hex digits. Only unique
/// enough to tell widgets in one process apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(u32);

impl WidgetId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().as_u128() as u32)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_eight_hex_digits() {
        let id = WidgetId(0xab);
        assert_eq!(id.to_string(), "000000ab");

        let shown = WidgetId::new().to_string();
        assert_eq!(shown.len(), 8);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn serializes_as_bare_number() {
        let id = WidgetId(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: WidgetId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
        assert_eq!(back.as_u32(), 7);
    }
}
