use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token naming one native engine instance.
///
/// The value is never interpreted on this side of the boundary. `0` means
/// "not created yet" or "already closed"; every native call other than
/// initialize is guarded on [`Handle::is_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Handle(i64);

impl Handle {
    pub const NONE: Handle = Handle(0);

    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn is_live(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Size and on-screen position of the host widget, in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
    pub screen_x: i32,
    pub screen_y: i32,
}

impl Geometry {
    pub const fn new(width: i32, height: i32, screen_x: i32, screen_y: i32) -> Self {
        Self {
            width,
            height,
            screen_x,
            screen_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationDecision {
    Allowed,
    Denied,
}

impl NavigationDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl From<bool> for NavigationDecision {
    fn from(allow: bool) -> Self {
        if allow {
            Self::Allowed
        } else {
            Self::Denied
        }
    }
}
