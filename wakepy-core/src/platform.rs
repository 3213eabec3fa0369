//! Platform tags and the composite-expansion matching rule.

use strum::Display;

/// A closed set of platform tags. `UnixLikeFoss`, `Bsd` and `Any` are
/// composites that expand to concrete tags at match time; they are never
/// returned by [`current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PlatformTag {
    Windows,
    Macos,
    Linux,
    Freebsd,
    /// Linux ∪ FreeBSD.
    UnixLikeFoss,
    /// Macos ∪ Freebsd, i.e. the BSD family including Darwin.
    Bsd,
    /// Matches every concrete platform.
    Any,
}

impl PlatformTag {
    /// The concrete tags a (possibly composite) declared tag expands to.
    fn expand(self) -> &'static [PlatformTag] {
        use PlatformTag::{Any, Bsd, Freebsd, Linux, Macos, UnixLikeFoss, Windows};
        match self {
            Windows => &[Windows],
            Macos => &[Macos],
            Linux => &[Linux],
            Freebsd => &[Freebsd],
            UnixLikeFoss => &[Linux, Freebsd],
            Bsd => &[Macos, Freebsd],
            Any => &[Windows, Macos, Linux, Freebsd],
        }
    }

    /// Does `declared` (a platform-support tag on a Method) cover the
    /// concrete, actually-running `actual` platform?
    #[must_use]
    pub fn matches(actual: PlatformTag, declared: PlatformTag) -> bool {
        declared.expand().contains(&actual)
    }
}

/// The concrete platform tag for the host this process is running on.
///
/// Always one of `Windows | Macos | Linux | Freebsd`; never a composite.
#[must_use]
pub fn current() -> PlatformTag {
    if cfg!(target_os = "windows") {
        PlatformTag::Windows
    } else if cfg!(target_os = "macos") {
        PlatformTag::Macos
    } else if cfg!(target_os = "freebsd") {
        PlatformTag::Freebsd
    } else {
        // Includes Linux; any other unix-like host is simply unsupported
        // by any shipped Method and gets filtered out at the
        // platform-support stage.
        PlatformTag::Linux
    }
}
