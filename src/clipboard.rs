use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard error: {0}")]
    System(#[from] arboard::Error),
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Destination for shared dream text.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard using arboard, opened on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    hold_until_replaced: bool,
}

impl SystemClipboard {
    /// For long-running callers; contents stay available while this value lives.
    pub fn new() -> Self {
        Self::default()
    }

    /// For one-shot processes. On X11 and Wayland the copied text only lives as long as
    /// its owner, so `set_text` blocks until another application takes the selection.
    pub fn hold_until_replaced() -> Self {
        Self {
            inner: None,
            hold_until_replaced: true,
        }
    }

    /// Whether `set_text` blocks on this platform.
    pub fn blocks_on_set(&self) -> bool {
        self.hold_until_replaced && cfg!(target_os = "linux")
    }

    fn ensure(&mut self) -> Result<&mut arboard::Clipboard, ClipboardError> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new()?);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("clipboard not initialised".into()))
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let hold = self.hold_until_replaced;
        let clipboard = self.ensure()?;
        write_text(clipboard, text, hold)
    }
}

#[cfg(target_os = "linux")]
fn write_text(
    clipboard: &mut arboard::Clipboard,
    text: &str,
    hold: bool,
) -> Result<(), ClipboardError> {
    use arboard::SetExtLinux;
    if hold {
        clipboard.set().wait().text(text.to_string())?;
    } else {
        clipboard.set_text(text.to_string())?;
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn write_text(
    clipboard: &mut arboard::Clipboard,
    text: &str,
    _hold: bool,
) -> Result<(), ClipboardError> {
    clipboard.set_text(text.to_string())?;
    Ok(())
}

/// In-process clipboard; keeps the last copied text.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
    unavailable: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            contents: None,
            unavailable: true,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.unavailable {
            return Err(ClipboardError::Unavailable("no clipboard attached".into()));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}
