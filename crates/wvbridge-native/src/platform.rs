use std::fmt;

use wvbridge_common::LoaderError;

/// Operating systems the engine bridge ships a library for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// The platform this process runs on.
    pub fn current() -> Result<Self, LoaderError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value.
    pub fn from_os(os: &str) -> Result<Self, LoaderError> {
        match os {
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            other => Err(LoaderError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn library_prefix(self) -> &'static str {
        match self {
            Self::MacOs | Self::Linux => "lib",
            Self::Windows => "",
        }
    }

    pub fn library_extension(self) -> &'static str {
        match self {
            Self::MacOs => "dylib",
            Self::Linux => "so",
            Self::Windows => "dll",
        }
    }

    /// File name of the bundled library, e.g. `libwvbridge.so`.
    pub fn resource_name(self, library_name: &str) -> String {
        format!(
            "{}{}.{}",
            self.library_prefix(),
            library_name,
            self.library_extension()
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_per_platform() {
        assert_eq!(Platform::MacOs.resource_name("wvbridge"), "libwvbridge.dylib");
        assert_eq!(Platform::Linux.resource_name("wvbridge"), "libwvbridge.so");
        assert_eq!(Platform::Windows.resource_name("wvbridge"), "wvbridge.dll");
    }

    #[test]
    fn from_os_recognizes_three_platforms() {
        assert_eq!(Platform::from_os("macos").unwrap(), Platform::MacOs);
        assert_eq!(Platform::from_os("linux").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_os("windows").unwrap(), Platform::Windows);
    }

    #[test]
    fn from_os_rejects_others() {
        let err = Platform::from_os("freebsd").unwrap_err();
        assert_eq!(err, LoaderError::UnsupportedPlatform("freebsd".into()));
    }

    #[test]
    fn display_round_trips_through_from_os() {
        for p in [Platform::MacOs, Platform::Linux, Platform::Windows] {
            assert_eq!(Platform::from_os(&p.to_string()).unwrap(), p);
        }
    }
}
