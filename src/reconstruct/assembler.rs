//! Ordered assembly of per-page results into the element stream.

use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::DocumentElement;

/// Lifecycle of one page slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Not yet picked up
    Start,
    /// A worker is producing elements
    Extracting,
    /// Elements committed
    Finalized,
    /// Processing failed; the page contributes nothing
    Failed,
}

#[derive(Debug)]
struct Slot {
    state: PageState,
    elements: Option<Vec<DocumentElement>>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: PageState::Start,
            elements: None,
        }
    }
}

/// Collects page results from any number of workers.
///
/// Each selected page owns one slot, written exactly once. The final stream
/// is the concatenation of finalized slots in slot order, with a page break
/// between consecutive finalized pages, so the result does not depend on
/// the order in which workers finish.
#[derive(Debug)]
pub struct DocumentAssembler {
    slots: Mutex<Vec<Slot>>,
}

impl DocumentAssembler {
    /// Create an assembler with `page_count` empty slots.
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: Mutex::new((0..page_count).map(|_| Slot::new()).collect()),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current state of a slot.
    pub fn state(&self, slot: usize) -> Option<PageState> {
        self.lock().get(slot).map(|s| s.state)
    }

    /// Mark a slot as being extracted.
    pub fn begin(&self, slot: usize) -> Result<()> {
        self.transition(slot, PageState::Start, PageState::Extracting)
    }

    /// Commit the elements of a slot. Fails if the slot was not being
    /// extracted, which includes a second commit.
    pub fn commit(&self, slot: usize, elements: Vec<DocumentElement>) -> Result<()> {
        let mut slots = self.lock();
        let entry = slots
            .get_mut(slot)
            .ok_or_else(|| Error::Other(format!("no page slot {}", slot)))?;

        if entry.state != PageState::Extracting {
            return Err(Error::Other(format!(
                "cannot commit page slot {} in state {:?}",
                slot, entry.state
            )));
        }

        entry.elements = Some(elements);
        entry.state = PageState::Finalized;
        Ok(())
    }

    /// Mark a slot as failed. Its page will contribute no elements.
    pub fn fail(&self, slot: usize) -> Result<()> {
        let mut slots = self.lock();
        let entry = slots
            .get_mut(slot)
            .ok_or_else(|| Error::Other(format!("no page slot {}", slot)))?;

        if entry.state == PageState::Finalized {
            return Err(Error::Other(format!(
                "page slot {} is already finalized",
                slot
            )));
        }

        entry.elements = None;
        entry.state = PageState::Failed;
        Ok(())
    }

    /// Consume the assembler and produce the element stream.
    pub fn finish(self) -> Vec<DocumentElement> {
        let slots = self
            .slots
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut stream = Vec::new();
        let mut first = true;
        for slot in slots {
            if slot.state != PageState::Finalized {
                continue;
            }
            if let Some(elements) = slot.elements {
                if !first {
                    stream.push(DocumentElement::PageBreak);
                }
                first = false;
                stream.extend(elements);
            }
        }
        stream
    }

    fn transition(&self, slot: usize, from: PageState, to: PageState) -> Result<()> {
        let mut slots = self.lock();
        let entry = slots
            .get_mut(slot)
            .ok_or_else(|| Error::Other(format!("no page slot {}", slot)))?;

        if entry.state != from {
            return Err(Error::Other(format!(
                "page slot {} is {:?}, expected {:?}",
                slot, entry.state, from
            )));
        }
        entry.state = to;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    fn para(text: &str) -> DocumentElement {
        DocumentElement::Paragraph(Paragraph::with_text(text, 11.0))
    }

    #[test]
    fn test_state_machine() {
        let assembler = DocumentAssembler::new(1);
        assert_eq!(assembler.state(0), Some(PageState::Start));
        assert!(assembler.commit(0, vec![]).is_err());

        assembler.begin(0).unwrap();
        assert_eq!(assembler.state(0), Some(PageState::Extracting));
        assert!(assembler.begin(0).is_err());

        assembler.commit(0, vec![para("a")]).unwrap();
        assert_eq!(assembler.state(0), Some(PageState::Finalized));
        assert!(assembler.commit(0, vec![para("b")]).is_err());
        assert!(assembler.fail(0).is_err());
        assert_eq!(assembler.finish(), vec![para("a")]);
    }

    #[test]
    fn test_out_of_order_commits() {
        let assembler = DocumentAssembler::new(3);
        for slot in [2, 0, 1] {
            assembler.begin(slot).unwrap();
        }
        assembler.commit(2, vec![para("c")]).unwrap();
        assembler.commit(0, vec![para("a")]).unwrap();
        assembler.commit(1, vec![para("b")]).unwrap();

        assert_eq!(
            assembler.finish(),
            vec![
                para("a"),
                DocumentElement::PageBreak,
                para("b"),
                DocumentElement::PageBreak,
                para("c"),
            ]
        );
    }

    #[test]
    fn test_failed_pages_leave_no_trace() {
        let assembler = DocumentAssembler::new(3);
        for slot in 0..3 {
            assembler.begin(slot).unwrap();
        }
        assembler.commit(0, vec![para("a")]).unwrap();
        assembler.fail(1).unwrap();
        assembler.commit(2, vec![para("c")]).unwrap();

        assert_eq!(
            assembler.finish(),
            vec![para("a"), DocumentElement::PageBreak, para("c")]
        );
    }

    #[test]
    fn test_empty_page_still_separated() {
        let assembler = DocumentAssembler::new(2);
        assembler.begin(0).unwrap();
        assembler.begin(1).unwrap();
        assembler.commit(0, vec![]).unwrap();
        assembler.commit(1, vec![para("b")]).unwrap();

        assert_eq!(
            assembler.finish(),
            vec![DocumentElement::PageBreak, para("b")]
        );
    }

    #[test]
    fn test_no_pages() {
        let assembler = DocumentAssembler::new(0);
        assert!(assembler.is_empty());
        assert!(assembler.finish().is_empty());
    }
}
