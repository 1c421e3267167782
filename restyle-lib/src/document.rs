//! Documents whose stylesheets can be captured.
//!
//! A [`StyledDocument`] reports its URL and the text of every stylesheet attached to it, in
//! stylesheet order. Sheets that cannot be enumerated are reported as errors and skipped by
//! the snapshot, so callers never have to prove the list is complete.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use url::Url;

use crate::dom::dom_tree::{self, SheetRef};
use crate::error::SheetError;
use crate::parser::html::create_dom_tree;

/// A live document as seen by the recorder.
pub trait StyledDocument {
    /// Current URL of the document.
    fn url(&self) -> &str;

    /// Text of every attached stylesheet, in stylesheet order.
    fn style_sheets(&self) -> Vec<Result<String, SheetError>>;
}

/// What the host knows about the page when an editing session opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteInfo {
    pub domain: String,
    pub title: String,
    pub url: String,
    /// Data URL of the page favicon, when the host has one.
    pub favicon_image: Option<String>,
}

/// A document held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InlineDocument {
    url: String,
    sheets: Vec<Option<String>>,
}

impl InlineDocument {
    pub fn new(url: impl Into<String>) -> Self {
        InlineDocument {
            url: url.into(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, css: impl Into<String>) -> Self {
        self.push_sheet(css);
        self
    }

    /// Adds a sheet that cannot be enumerated, like a cross-origin sheet in a browser.
    pub fn with_unavailable_sheet(mut self) -> Self {
        self.sheets.push(None);
        self
    }

    pub fn push_sheet(&mut self, css: impl Into<String>) {
        self.sheets.push(Some(css.into()));
    }

    /// Replaces the text of the sheet at `index`. Returns false when there is no such sheet.
    pub fn replace_sheet(&mut self, index: usize, css: impl Into<String>) -> bool {
        match self.sheets.get_mut(index) {
            Some(sheet) => {
                *sheet = Some(css.into());
                true
            }
            None => false,
        }
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }
}

impl StyledDocument for InlineDocument {
    fn url(&self) -> &str {
        &self.url
    }

    fn style_sheets(&self) -> Vec<Result<String, SheetError>> {
        self.sheets
            .iter()
            .map(|sheet| sheet.clone().ok_or(SheetError::Unavailable))
            .collect()
    }
}

/// An HTML page on disk.
///
/// The file is re-read on every capture so edits made by another tool between two
/// captures are visible. `<link rel="stylesheet">` hrefs are resolved against the file's
/// own location; anything that does not resolve to a local file is cross-origin.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    path: PathBuf,
    location: Url,
    url: Url,
}

impl HtmlPage {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = fs::canonicalize(path.as_ref())?;
        let location = Url::from_file_path(&path).map_err(|()| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' cannot be expressed as a file URL", path.display()),
            )
        })?;
        Ok(HtmlPage {
            path,
            url: location.clone(),
            location,
        })
    }

    /// Reports `url` as the document URL instead of the file's own `file://` URL.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> io::Result<dom_tree::Document> {
        let html = fs::read_to_string(&self.path)?;
        Ok(create_dom_tree(&html))
    }

    pub fn site_info(&self) -> io::Result<SiteInfo> {
        let document = self.load()?;
        Ok(SiteInfo {
            domain: self.url.host_str().unwrap_or_default().to_string(),
            title: document.title().unwrap_or_default(),
            url: self.url.to_string(),
            favicon_image: None,
        })
    }

    fn read_linked(&self, href: &str) -> Result<String, SheetError> {
        let resolved = self
            .location
            .join(href)
            .map_err(|_| SheetError::BadHref(href.to_string()))?;
        if resolved.scheme() != "file" || resolved.host().is_some() {
            return Err(SheetError::CrossOrigin(resolved.to_string()));
        }
        let path = resolved
            .to_file_path()
            .map_err(|()| SheetError::BadHref(href.to_string()))?;
        fs::read_to_string(&path).map_err(|source| SheetError::Unreadable { path, source })
    }
}

impl StyledDocument for HtmlPage {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    fn style_sheets(&self) -> Vec<Result<String, SheetError>> {
        let document = match self.load() {
            Ok(document) => document,
            Err(source) => {
                return vec![Err(SheetError::Unreadable {
                    path: self.path.clone(),
                    source,
                })]
            }
        };

        document
            .style_sheets()
            .into_iter()
            .map(|sheet| match sheet {
                SheetRef::Inline(css) => Ok(css),
                SheetRef::Linked(href) => self.read_linked(&href),
            })
            .collect()
    }
}
