//! Page-session collaborator.
//!
//! Report pages render their statement list and statement frames
//! asynchronously, so they are driven through a stateful session. The
//! [`PageSession`] trait is the capability surface the navigator consumes; it
//! does not depend on a particular automation engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use crate::error::Result;

/// How to find an element on the current page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// By `id` attribute.
    Id(String),
    /// By `name` attribute.
    Name(String),
    /// By CSS selector.
    Css(String),
    /// By XPath expression.
    XPath(String),
}

impl Locator {
    /// Locator by `id`.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Locator by `name`.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Locator by CSS selector.
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Returns an equivalent CSS selector, if one exists.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(format!("[id='{}']", escape_css(id))),
            Self::Name(name) => Some(format!("[name='{}']", escape_css(name))),
            Self::Css(css) => Some(css.clone()),
            Self::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => write!(f, "[name={name}]"),
            Self::Css(css) => f.write_str(css),
            Self::XPath(xpath) => f.write_str(xpath),
        }
    }
}

/// Escapes a value for use inside a single-quoted CSS string.
#[must_use]
pub fn escape_css(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Snapshot of a page element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name, lowercase.
    pub tag: String,
    /// Rendered text content.
    pub text: String,
    /// Attributes by name.
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the `value` attribute when it is non-empty.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.attribute("value").filter(|v| !v.trim().is_empty())
    }
}

/// Stateful page session (a browser tab or an equivalent).
///
/// Lookups report a miss as [`EnetError::ElementNotFound`](crate::EnetError::ElementNotFound)
/// so callers can poll for asynchronously rendered content.
#[async_trait]
pub trait PageSession: Send + Sync + Debug {
    /// Loads a URL in the outer context.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Returns the URL of the outer page.
    async fn current_url(&self) -> Result<String>;

    /// Finds the first element matching `locator` in the current context.
    async fn find_element(&self, locator: &Locator) -> Result<Element>;

    /// Finds every element matching `locator` in the current context.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>>;

    /// Clicks the first element matching `locator`.
    async fn click(&mut self, locator: &Locator) -> Result<()>;

    /// Types into the first element matching `locator`.
    async fn send_keys(&mut self, locator: &Locator, keys: &str) -> Result<()>;

    /// Enters the frame matching `locator`.
    ///
    /// `src_hint` is the URL the page's scripts would load into the frame;
    /// sessions that do not execute scripts load it themselves.
    async fn switch_to_frame(&mut self, locator: &Locator, src_hint: Option<&str>) -> Result<()>;

    /// Returns to the outer page.
    async fn switch_to_default(&mut self) -> Result<()>;

    /// Returns the markup of the current context.
    async fn page_source(&self) -> Result<String>;

    /// Ends the session and releases its resources.
    async fn quit(&mut self) -> Result<()>;
}
