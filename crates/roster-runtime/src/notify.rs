#![forbid(unsafe_code)]

//! Operator notifications (toasts) raised by the coordinator.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Classified cause, for error notices.
    pub detail: Option<String>,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Receiver of operator notifications.
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

impl<F: Fn(&Notice)> Notifier for F {
    fn notify(&self, notice: &Notice) {
        self(notice);
    }
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: &Notice) {}
}

/// Buffers notices until the host drains them.
///
/// Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    entries: Rc<RefCell<Vec<Notice>>>,
}

impl NoticeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain buffered notices in arrival order.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Messages currently buffered, without draining.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: &Notice) {
        self.entries.borrow_mut().push(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn closures_are_notifiers() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let notifier = move |_: &Notice| seen.set(seen.get() + 1);
        notifier.notify(&Notice::success("ok"));
        notifier.notify(&Notice::error("bad"));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn log_drains_in_order() {
        let log = NoticeLog::new();
        let shared = log.clone();
        shared.notify(&Notice::success("first"));
        shared.notify(&Notice::error("second").with_detail("Resource not found."));
        assert_eq!(log.len(), 2);
        let drained = log.take();
        assert_eq!(drained[0].message, "first");
        assert!(drained[1].is_error());
        assert_eq!(drained[1].to_string(), "second (Resource not found.)");
        assert!(log.is_empty());
    }
}
