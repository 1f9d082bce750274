#![forbid(unsafe_code)]

//! Platform-independent shell core.
//!
//! This module contains the logic shared between the wasm-bindgen exports
//! and the native test harness. No JS/WASM types here: inputs and outputs
//! are plain Rust values or JSON strings.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::Serialize;
use tracing::debug;

use roster_client::RemoteCollection;
use roster_core::validate::{FieldError, validate_draft};
use roster_core::{Collection, Config, Record, RecordId};
use roster_runtime::{
    CacheOptions, Coordinator, Notice, NoticeLevel, NoticeLog, QueryStatus, Subscription, SyncError,
};
use roster_widgets::{Viewport, Virtualizer, WindowOptions};

/// Why a shell action was refused or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The draft payload was not a customer object.
    Malformed(String),
    /// The draft broke one or more field rules; nothing was sent.
    Invalid(Vec<FieldError>),
    /// The host passed an id that is not a whole number.
    InvalidId(String),
    Sync(SyncError),
}

impl ShellError {
    /// Operator-facing message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Malformed(reason) => format!("Invalid customer data: {reason}"),
            Self::Invalid(errors) => errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
            Self::InvalidId(raw) => format!("Invalid customer id: {raw}"),
            Self::Sync(err) => err.user_message(),
        }
    }
}

impl From<SyncError> for ShellError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed draft: {reason}"),
            Self::Invalid(errors) => write!(f, "draft failed {} field rule(s)", errors.len()),
            Self::InvalidId(raw) => write!(f, "invalid record id {raw}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ShellError {}

/// One row to draw, positioned in content coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub index: usize,
    pub top: f64,
    pub height: f64,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: &'static str,
    pub message: &'static str,
}

/// Result of checking a draft against the form rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<FieldReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeView {
    pub level: &'static str,
    pub message: String,
    pub detail: Option<String>,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            level: match notice.level {
                NoticeLevel::Success => "success",
                NoticeLevel::Error => "error",
            },
            message: notice.message,
            detail: notice.detail,
        }
    }
}

/// Decode a draft from the form's JSON payload. Any `id` is ignored.
pub fn parse_draft(json: &str) -> Result<Record, ShellError> {
    serde_json::from_str::<Record>(json)
        .map(|record| record.to_draft())
        .map_err(|err| ShellError::Malformed(err.to_string()))
}

/// Largest integer a JS number holds exactly.
const MAX_SAFE_ID: f64 = 9_007_199_254_740_991.0;

/// Convert an id handed over as a JS number. Fractions, NaN, infinities and
/// values beyond the safe-integer range are refused.
pub fn parse_id(raw: f64) -> Result<RecordId, ShellError> {
    if raw.is_finite() && raw.fract() == 0.0 && raw.abs() <= MAX_SAFE_ID {
        Ok(RecordId(raw as i64))
    } else {
        Err(ShellError::InvalidId(raw.to_string()))
    }
}

fn report(errors: &[FieldError]) -> ValidationReport {
    ValidationReport {
        valid: errors.is_empty(),
        errors: errors
            .iter()
            .map(|e| FieldReport {
                field: e.field.as_str(),
                message: e.message,
            })
            .collect(),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Coordinator plus list window, wired together.
pub struct ShellCore<C> {
    coord: Coordinator<C>,
    window: Rc<RefCell<Virtualizer>>,
    notices: NoticeLog,
    /// Set when a new collection lands; cleared by [`Self::take_redraw`].
    dirty: Rc<Cell<bool>>,
    _sync: Subscription,
}

impl<C: RemoteCollection + 'static> ShellCore<C> {
    pub fn new(client: C, config: &Config) -> Self {
        let notices = NoticeLog::new();
        let coord = Coordinator::builder(client)
            .options(CacheOptions::from(config))
            .notifier(Rc::new(notices.clone()))
            .build();
        Self::with_coordinator(coord, WindowOptions::from(config), notices)
    }

    /// Wire an already-built coordinator. `notices` must be the log the
    /// coordinator notifies.
    pub fn with_coordinator(coord: Coordinator<C>, options: WindowOptions, notices: NoticeLog) -> Self {
        let window = Rc::new(RefCell::new(Virtualizer::new(options)));
        let dirty = Rc::new(Cell::new(false));

        let sink = Rc::clone(&window);
        let flag = Rc::clone(&dirty);
        let sync = coord.subscribe(move |collection| {
            sink.borrow_mut().set_item_count(collection.len());
            flag.set(true);
        });

        Self {
            coord,
            window,
            notices,
            dirty,
            _sync: sync,
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator<C> {
        &self.coord
    }

    pub fn load(&self) -> LocalBoxFuture<'static, Result<Rc<Collection>, ShellError>> {
        self.coord.load().map(|r| r.map_err(ShellError::from)).boxed_local()
    }

    pub fn refresh(&self) -> LocalBoxFuture<'static, Result<Rc<Collection>, ShellError>> {
        self.coord.refresh().map(|r| r.map_err(ShellError::from)).boxed_local()
    }

    /// Validate and submit a new customer.
    pub fn create(&self, json: &str) -> LocalBoxFuture<'static, Result<Record, ShellError>> {
        match self.checked_draft(json) {
            Ok(draft) => self
                .coord
                .create(draft)
                .map(|r| r.map_err(ShellError::from))
                .boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    /// Validate and submit changes to an existing customer.
    pub fn update(&self, id: RecordId, json: &str) -> LocalBoxFuture<'static, Result<Record, ShellError>> {
        match self.checked_draft(json) {
            Ok(draft) => self
                .coord
                .update(id, draft)
                .map(|r| r.map_err(ShellError::from))
                .boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    /// Delete a customer. The host asks the operator to confirm first.
    pub fn remove(&self, id: RecordId) -> LocalBoxFuture<'static, Result<(), ShellError>> {
        self.coord
            .delete(id)
            .map(|r| r.map_err(ShellError::from))
            .boxed_local()
    }

    /// Report scroll position and viewport height. Returns whether the
    /// host should redraw.
    pub fn set_viewport(&self, scroll_offset: f64, viewport_height: f64) -> bool {
        let changed = self
            .window
            .borrow_mut()
            .set_viewport(Viewport::new(scroll_offset, viewport_height));
        self.take_redraw() || changed
    }

    /// Whether a new collection arrived since the last call.
    pub fn take_redraw(&self) -> bool {
        self.dirty.replace(false)
    }

    /// Rows to draw for the current viewport.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<RowView> {
        let Some(collection) = self.coord.collection() else {
            return Vec::new();
        };
        let window = self.window.borrow();
        window
            .virtual_items()
            .into_iter()
            .filter_map(|item| {
                let record = collection.get(item.index)?.clone();
                Some(RowView {
                    index: item.index,
                    top: item.start,
                    height: item.size,
                    record,
                })
            })
            .collect()
    }

    #[must_use]
    pub fn visible_rows_json(&self) -> String {
        to_json(&self.visible_rows())
    }

    /// Height of the scroll placeholder.
    #[must_use]
    pub fn total_size(&self) -> f64 {
        self.window.borrow().total_size()
    }

    /// Check a draft without submitting it.
    #[must_use]
    pub fn validate(&self, json: &str) -> ValidationReport {
        match parse_draft(json) {
            Ok(draft) => match validate_draft(&draft) {
                Ok(()) => report(&[]),
                Err(errors) => report(&errors),
            },
            Err(err) => {
                debug!(error = %err, "draft payload rejected");
                ValidationReport {
                    valid: false,
                    errors: vec![FieldReport {
                        field: "form",
                        message: "Invalid customer data",
                    }],
                }
            }
        }
    }

    #[must_use]
    pub fn validate_json(&self, json: &str) -> String {
        to_json(&self.validate(json))
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&self) -> Vec<NoticeView> {
        self.notices.take().into_iter().map(NoticeView::from).collect()
    }

    pub fn take_notices_json(&self) -> String {
        to_json(&self.take_notices())
    }

    #[must_use]
    pub fn status(&self) -> &'static str {
        match self.coord.snapshot().status {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Error => "error",
            QueryStatus::Success => "success",
        }
    }

    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.coord.is_mutating()
    }

    fn checked_draft(&self, json: &str) -> Result<Record, ShellError> {
        let draft = parse_draft(json)?;
        validate_draft(&draft).map_err(ShellError::Invalid)?;
        Ok(draft)
    }
}
