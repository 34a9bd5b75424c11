// crates/engine/src/adapters/events.rs

//! An in-memory policy document: a recorded list of markup events.
//!
//! Hosts that already parse XML can push their parser's events into an
//! `EventDocument` (or implement `PolicyEventSource` directly); tests use the
//! builder methods to write documents inline.

use crate::domain::collaborators::{PolicyEvent, PolicyEventSource, StartTag};
use crate::domain::error::EngineResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDocument {
    events: Vec<PolicyEvent>,
}

impl EventDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, name: &str, attributes: &[(&str, &str)]) -> Self {
        let attributes = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.events.push(PolicyEvent::Start(StartTag::new(name, attributes)));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.events.push(PolicyEvent::Text(text.to_string()));
        self
    }

    pub fn end(mut self, name: &str) -> Self {
        self.events.push(PolicyEvent::End(name.to_string()));
        self
    }

    /// `<name attrs>text</name>`
    pub fn element(self, name: &str, attributes: &[(&str, &str)], text: &str) -> Self {
        self.start(name, attributes).text(text).end(name)
    }

    /// `<name attrs/>`
    pub fn empty_element(self, name: &str, attributes: &[(&str, &str)]) -> Self {
        self.start(name, attributes).end(name)
    }

    pub fn push(&mut self, event: PolicyEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PolicyEvent] {
        &self.events
    }

    pub fn reader(&self) -> EventCursor<'_> {
        EventCursor {
            events: &self.events,
            position: 0,
        }
    }
}

impl From<Vec<PolicyEvent>> for EventDocument {
    fn from(events: Vec<PolicyEvent>) -> Self {
        Self { events }
    }
}

/// Reads an `EventDocument` front to back. A trailing `EndDocument` is
/// implied, so documents don't need to record one.
#[derive(Debug, Clone)]
pub struct EventCursor<'a> {
    events: &'a [PolicyEvent],
    position: usize,
}

impl PolicyEventSource for EventCursor<'_> {
    fn next_event(&mut self) -> EngineResult<PolicyEvent> {
        match self.events.get(self.position) {
            Some(event) => {
                self.position += 1;
                Ok(event.clone())
            }
            None => Ok(PolicyEvent::EndDocument),
        }
    }
}
