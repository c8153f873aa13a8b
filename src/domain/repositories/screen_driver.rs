//! Screen Driver Trait
//!
//! The accessibility-tree automation layer as the pipelines consume it:
//! find elements by locator, read attributes, click, swipe, clipboard and back
//! navigation. Any call may fail with a transient [`AutomationError`]; callers
//! decide whether to retry.

use crate::domain::errors::AutomationError;
use async_trait::async_trait;

pub type AutomationResult<T> = Result<T, AutomationError>;

/// Opaque handle to an on-screen element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

/// Position and size of an element or the window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

#[async_trait]
pub trait ScreenDriver: Send + Sync {
    /// Elements matching an XPath locator, in document order
    async fn find_elements(&self, xpath: &str) -> AutomationResult<Vec<ElementHandle>>;

    /// Attribute value, `None` when the element does not carry it
    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> AutomationResult<Option<String>>;

    async fn click(&self, element: &ElementHandle) -> AutomationResult<()>;

    async fn window_rect(&self) -> AutomationResult<Rect>;

    async fn swipe(
        &self,
        from: (i64, i64),
        to: (i64, i64),
        duration_millis: u64,
    ) -> AutomationResult<()>;

    async fn clipboard_text(&self) -> AutomationResult<String>;

    async fn set_clipboard_text(&self, text: &str) -> AutomationResult<()>;

    async fn back(&self) -> AutomationResult<()>;
}
