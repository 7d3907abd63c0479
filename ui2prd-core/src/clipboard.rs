//! Clipboard access
//!
//! Copy-as-text goes through the [`Clipboard`] trait so front ends can use
//! the system clipboard while tests use [`MemoryClipboard`].

use thiserror::Error;

use crate::export;
use crate::models::RequirementItem;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write to clipboard: {0}")]
    WriteFailed(String),
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The platform clipboard
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl SystemClipboard {
    /// Sets the text and keeps serving it until another program takes the
    /// selection over
    ///
    /// On X11 and Wayland the contents are owned by this process, so a
    /// short-lived program must call this instead of `set_text`. Elsewhere
    /// it behaves like `set_text`.
    #[cfg(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    ))]
    pub fn set_text_and_wait(&mut self, text: &str) -> Result<(), ClipboardError> {
        use arboard::SetExtLinux;

        self.inner
            .set()
            .wait()
            .text(text.to_string())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }

    #[cfg(not(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    )))]
    pub fn set_text_and_wait(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.set_text(text)
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}

type Opener = Box<dyn FnMut() -> Result<Box<dyn Clipboard>, ClipboardError>>;

/// Opens a clipboard on first use and keeps it open
///
/// Linux clipboards only hold text while the owning handle is alive, so
/// long-running front ends keep one of these for their whole lifetime. A
/// failed open is retried on the next write.
pub struct LazyClipboard {
    open: Opener,
    inner: Option<Box<dyn Clipboard>>,
}

impl LazyClipboard {
    pub fn new<F>(open: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn Clipboard>, ClipboardError> + 'static,
    {
        Self {
            open: Box::new(open),
            inner: None,
        }
    }

    /// Backed by the platform clipboard
    pub fn system() -> Self {
        Self::new(|| Ok(Box::new(SystemClipboard::new()?) as Box<dyn Clipboard>))
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

impl Clipboard for LazyClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = match &mut self.inner {
            Some(clipboard) => clipboard,
            slot => slot.insert((self.open)()?),
        };
        clipboard.set_text(text)
    }
}

impl std::fmt::Debug for LazyClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyClipboard")
            .field("open", &self.is_open())
            .finish()
    }
}

/// In-memory clipboard, optionally failing every write
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            contents: None,
            fail: true,
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::WriteFailed("clipboard is read-only".to_string()));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Copies a region's rows as tab-separated text
///
/// Returns `Ok(false)` without touching the clipboard when there are no rows.
pub fn copy_items<'a, I>(clipboard: &mut dyn Clipboard, items: I) -> Result<bool, ClipboardError>
where
    I: IntoIterator<Item = &'a RequirementItem>,
{
    let Some(text) = export::to_tsv(items) else {
        return Ok(false);
    };

    clipboard.set_text(&text).map_err(|e| {
        log::warn!("Copy failed: {}", e);
        e
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Shares written text with the test after the clipboard is boxed
    struct SharedClipboard(Rc<RefCell<Vec<String>>>);

    impl Clipboard for SharedClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_copy_items_writes_tsv() {
        let item = RequirementItem::new("Nav", "Login");
        let mut clipboard = MemoryClipboard::new();

        assert_eq!(copy_items(&mut clipboard, [&item]), Ok(true));
        let text = clipboard.contents.unwrap();
        assert!(text.starts_with("功能\t描述"));
        assert!(text.ends_with("Login\t\t\t\t"));
    }

    #[test]
    fn test_copy_empty_region_is_noop() {
        let mut clipboard = MemoryClipboard::new();
        let none: Vec<&RequirementItem> = Vec::new();
        assert_eq!(copy_items(&mut clipboard, none), Ok(false));
        assert!(clipboard.contents.is_none());
    }

    #[test]
    fn test_copy_failure_is_reported() {
        let item = RequirementItem::new("Nav", "Login");
        let mut clipboard = MemoryClipboard::failing();
        assert!(matches!(
            copy_items(&mut clipboard, [&item]),
            Err(ClipboardError::WriteFailed(_))
        ));
    }

    #[test]
    fn test_lazy_clipboard_opens_once_and_stays_open() {
        let opens = Rc::new(Cell::new(0));
        let written = Rc::new(RefCell::new(Vec::new()));
        let mut clipboard = {
            let opens = Rc::clone(&opens);
            let written = Rc::clone(&written);
            LazyClipboard::new(move || {
                opens.set(opens.get() + 1);
                Ok(Box::new(SharedClipboard(Rc::clone(&written))) as Box<dyn Clipboard>)
            })
        };
        assert!(!clipboard.is_open());

        let nav = RequirementItem::new("Nav", "Login");
        let list = RequirementItem::new("List", "Search");
        assert_eq!(copy_items(&mut clipboard, [&nav]), Ok(true));
        assert_eq!(copy_items(&mut clipboard, [&list]), Ok(true));

        assert!(clipboard.is_open());
        assert_eq!(opens.get(), 1);
        let written = written.borrow();
        assert_eq!(written.len(), 2);
        assert!(written[1].contains("Search"));
    }

    #[test]
    fn test_lazy_clipboard_retries_failed_open() {
        let attempts = Rc::new(Cell::new(0));
        let mut clipboard = {
            let attempts = Rc::clone(&attempts);
            LazyClipboard::new(move || {
                attempts.set(attempts.get() + 1);
                if attempts.get() == 1 {
                    Err(ClipboardError::Unavailable("no display".to_string()))
                } else {
                    Ok(Box::new(MemoryClipboard::new()) as Box<dyn Clipboard>)
                }
            })
        };

        let item = RequirementItem::new("Nav", "Login");
        assert!(matches!(
            copy_items(&mut clipboard, [&item]),
            Err(ClipboardError::Unavailable(_))
        ));
        assert!(!clipboard.is_open());

        assert_eq!(copy_items(&mut clipboard, [&item]), Ok(true));
        assert_eq!(attempts.get(), 2);
    }
}
