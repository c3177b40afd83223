//! Operator-facing output: the status line, the list of discovered readers
//! and the "step done" markers.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::terminal::Reader;

/// The six user-triggered steps of a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutStep {
    Initialize = 1,
    DiscoverReaders = 2,
    ConnectReader = 3,
    InitiateCheckout = 4,
    CollectPayment = 5,
    CapturePayment = 6,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step-{}-done", *self as u8)
    }
}

/// One selectable line of the reader list, keyed by its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderEntry {
    pub index: usize,
    pub id: String,
    pub location: String,
    pub label: String,
}

/// Build the entries shown for a discovery result, in discovery order
pub fn reader_entries(readers: &[Reader]) -> Vec<ReaderEntry> {
    readers
        .iter()
        .enumerate()
        .map(|(index, reader)| ReaderEntry {
            index,
            id: reader.id.clone(),
            location: reader.location.clone(),
            label: reader.label.clone(),
        })
        .collect()
}

/// Where the workflow reports progress
pub trait StatusDisplay: Send + Sync {
    fn set_status(&self, status: &str);

    fn render_readers(&self, entries: &[ReaderEntry]);

    fn mark_step_done(&self, step: CheckoutStep);
}

/// Prints to stdout for an operator at a terminal
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl StatusDisplay for ConsoleDisplay {
    fn set_status(&self, status: &str) {
        println!("📟 {status}");
    }

    fn render_readers(&self, entries: &[ReaderEntry]) {
        if entries.is_empty() {
            return;
        }
        for entry in entries {
            println!("   [{}] Reader", entry.index);
            println!("       ID: {}", entry.id);
            println!("       Location: {}", entry.location);
            println!("       Label: {}", entry.label);
        }
        println!("   💡 Run 'connect <index>' to connect to a reader");
    }

    fn mark_step_done(&self, step: CheckoutStep) {
        println!("✅ {step}");
    }
}

#[derive(Debug, Default)]
struct Recorded {
    statuses: Vec<String>,
    readers: Vec<ReaderEntry>,
    steps: Vec<CheckoutStep>,
}

/// Keeps everything in memory; cloning shares the same record
#[derive(Debug, Clone, Default)]
pub struct MemoryDisplay {
    inner: Arc<Mutex<Recorded>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The status field as it currently reads
    pub fn status(&self) -> Option<String> {
        self.lock().statuses.last().cloned()
    }

    pub fn status_history(&self) -> Vec<String> {
        self.lock().statuses.clone()
    }

    pub fn readers(&self) -> Vec<ReaderEntry> {
        self.lock().readers.clone()
    }

    pub fn completed_steps(&self) -> Vec<CheckoutStep> {
        self.lock().steps.clone()
    }
}

impl StatusDisplay for MemoryDisplay {
    fn set_status(&self, status: &str) {
        self.lock().statuses.push(status.to_string());
    }

    fn render_readers(&self, entries: &[ReaderEntry]) {
        // An empty result leaves the previous list on screen
        if !entries.is_empty() {
            self.lock().readers = entries.to_vec();
        }
    }

    fn mark_step_done(&self, step: CheckoutStep) {
        let mut recorded = self.lock();
        if !recorded.steps.contains(&step) {
            recorded.steps.push(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_entries_keep_order_and_fields() {
        let readers = vec![
            Reader::new("tmr_a", "tml_front", "Front desk"),
            Reader::new("tmr_b", "tml_back", "Back office"),
            Reader::new("tmr_c", "tml_patio", "Patio"),
        ];

        let entries = reader_entries(&readers);
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.index, i);
            assert_eq!(entry.id, readers[i].id);
            assert_eq!(entry.location, readers[i].location);
            assert_eq!(entry.label, readers[i].label);
        }
    }

    #[test]
    fn test_step_marker_names() {
        assert_eq!(CheckoutStep::Initialize.to_string(), "step-1-done");
        assert_eq!(CheckoutStep::CapturePayment.to_string(), "step-6-done");
    }

    #[test]
    fn test_memory_display_tracks_latest_status() {
        let display = MemoryDisplay::new();
        assert_eq!(display.status(), None);
        display.set_status("initialized");
        display.set_status("discovered 1 reader(s)");
        assert_eq!(display.status().as_deref(), Some("discovered 1 reader(s)"));
        assert_eq!(display.status_history().len(), 2);

        display.mark_step_done(CheckoutStep::Initialize);
        display.mark_step_done(CheckoutStep::Initialize);
        assert_eq!(display.completed_steps(), vec![CheckoutStep::Initialize]);
    }
}
