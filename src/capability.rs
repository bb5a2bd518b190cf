/// Reports whether the host environment can present an element fullscreen.
pub trait FullscreenSupport: Send + Sync {
    fn is_supported(&self) -> bool;
}

/// A fixed answer, for hosts that know their capabilities up front.
#[derive(Debug, Clone, Copy)]
pub struct StaticFullscreen(pub bool);

impl FullscreenSupport for StaticFullscreen {
    fn is_supported(&self) -> bool {
        self.0
    }
}
