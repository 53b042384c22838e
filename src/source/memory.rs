//! In-memory page source.

use crate::error::{Error, Result};
use crate::model::{Page, PageContent};

use super::PageSource;

/// A [`PageSource`] over prebuilt page contents.
///
/// Useful for library callers that produce pages themselves, and for tests.
/// Pages may also be registered as failing to exercise error paths.
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    pages: Vec<std::result::Result<PageContent, String>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
        }
    }

    /// Append a page.
    pub fn with_page(mut self, content: PageContent) -> Self {
        self.pages.push(Ok(content));
        self
    }

    /// Append a page that fails to load with `reason`.
    pub fn with_failing_page(mut self, reason: impl Into<String>) -> Self {
        self.pages.push(Err(reason.into()));
        self
    }

    /// Append a page.
    pub fn push(&mut self, content: PageContent) {
        self.pages.push(Ok(content));
    }
}

impl PageSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn load_page(&self, index: u32) -> Result<Page> {
        match self.pages.get(index as usize) {
            Some(Ok(content)) => Ok(Page {
                index,
                content: content.clone(),
            }),
            Some(Err(reason)) => Err(Error::MalformedPage {
                page: index,
                reason: reason.clone(),
            }),
            None => Err(Error::PageOutOfRange(index + 1, self.page_count())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new("mem")
            .with_page(PageContent::Primitives(vec![]))
            .with_failing_page("broken");

        assert_eq!(source.name(), "mem");
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.load_page(0).unwrap().index, 0);
        assert!(matches!(
            source.load_page(1),
            Err(Error::MalformedPage { page: 1, .. })
        ));
        assert!(matches!(
            source.load_page(2),
            Err(Error::PageOutOfRange(3, 2))
        ));
    }
}
