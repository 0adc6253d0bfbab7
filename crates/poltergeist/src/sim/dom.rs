//! In-memory elements.
use std::fmt;

use super::{clock::SimTimer, selector::Selector};
use crate::{
    error::Result,
    event::{EventKind, Rect, SyntheticEvent, Target},
    query::Query,
    sync::{Shared, WeakShared},
    time::Timer,
    truthy::Truthy,
};

/// An event as it reached one element.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub event: SyntheticEvent,
    /// Virtual time of delivery, in milliseconds.
    pub at: f64,
    /// `false` when the event bubbled up from a descendant.
    pub at_target: bool,
}

struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    rect: Rect,
    parent: Option<WeakShared<ElementData>>,
    children: Vec<SimElement>,
    observers: Vec<(EventKind, Box<dyn FnOnce()>)>,
    deliveries: Vec<Delivery>,
}

/// An element of a [`SimDocument`].
///
/// Clones are handles to the same element.
#[derive(Clone)]
pub struct SimElement {
    data: Shared<ElementData>,
    timer: SimTimer,
}

impl PartialEq for SimElement {
    fn eq(&self, other: &Self) -> bool {
        self.data.ptr_eq(&other.data)
    }
}

impl fmt::Debug for SimElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.get();
        write!(f, "<{}", data.tag)?;
        for (key, value) in data.attributes.iter() {
            write!(f, r#" {}="{}""#, key, value)?;
        }
        write!(f, ">")
    }
}

impl Truthy for SimElement {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl SimElement {
    fn new(tag: &str, timer: &SimTimer) -> Self {
        SimElement {
            data: Shared::new(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: vec![],
                rect: Rect::default(),
                parent: None,
                children: vec![],
                observers: vec![],
                deliveries: vec![],
            }),
            timer: timer.clone(),
        }
    }

    pub fn tag(&self) -> String {
        self.data.get().tag.clone()
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    pub fn set_attribute(&self, key: impl AsRef<str>, value: impl Into<String>) {
        let (key, value) = (key.as_ref(), value.into());
        let mut data = self.data.get_mut();
        match data.attributes.iter().position(|(k, _)| k == key) {
            Some(i) => data.attributes[i].1 = value,
            None => data.attributes.push((key.to_string(), value)),
        }
    }

    pub fn with_attribute(self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn attribute(&self, key: impl AsRef<str>) -> Option<String> {
        self.data
            .get()
            .attributes
            .iter()
            .find(|(k, _)| k == key.as_ref())
            .map(|(_, v)| v.clone())
    }

    pub fn has_attribute(&self, key: impl AsRef<str>) -> bool {
        self.attribute(key).is_some()
    }

    pub fn remove_attribute(&self, key: impl AsRef<str>) {
        self.data
            .get_mut()
            .attributes
            .retain(|(k, _)| k != key.as_ref());
    }

    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|class| class.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn add_class(&self, class: impl AsRef<str>) {
        let mut classes = self.classes();
        if !classes.iter().any(|c| c == class.as_ref()) {
            classes.push(class.as_ref().to_string());
            self.set_attribute("class", classes.join(" "));
        }
    }

    pub fn rect(&self) -> Rect {
        self.data.get().rect
    }

    pub fn set_rect(&self, rect: Rect) {
        self.data.get_mut().rect = rect;
    }

    pub fn with_rect(self, rect: Rect) -> Self {
        self.set_rect(rect);
        self
    }

    pub fn parent(&self) -> Option<SimElement> {
        let parent = self.data.get().parent.as_ref()?.upgrade()?;
        Some(SimElement {
            data: parent,
            timer: self.timer.clone(),
        })
    }

    pub fn children(&self) -> Vec<SimElement> {
        self.data.get().children.clone()
    }

    /// Append `child`, moving it out of its current parent if it has one.
    ///
    /// Appending this element or one of its ancestors would close a loop in
    /// the tree, so it is refused and logged.
    pub fn append_child(&self, child: &SimElement) {
        if self.is_inclusive_descendant_of(child) {
            log::warn!("refusing to append {:?} inside itself", child);
            return;
        }
        child.detach();
        child.data.get_mut().parent = Some(self.data.downgrade());
        self.data.get_mut().children.push(child.clone());
    }

    pub fn remove_child(&self, child: &SimElement) {
        let removed = {
            let mut data = self.data.get_mut();
            let before = data.children.len();
            data.children.retain(|c| c != child);
            before != data.children.len()
        };
        if removed {
            child.data.get_mut().parent = None;
        }
    }

    fn is_inclusive_descendant_of(&self, ancestor: &SimElement) -> bool {
        let mut next = Some(self.clone());
        while let Some(node) = next {
            if node == *ancestor {
                return true;
            }
            next = node.parent();
        }
        false
    }

    /// Remove this element from its parent.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Every event delivered to this element so far, oldest first.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.data.get().deliveries.clone()
    }

    /// Number of one-shot observers still waiting.
    pub fn observer_count(&self) -> usize {
        self.data.get().observers.len()
    }

    /// Pre-order walk of this element's subtree, itself included.
    fn collect_subtree(&self, into: &mut Vec<SimElement>) {
        into.push(self.clone());
        for child in self.children() {
            child.collect_subtree(into);
        }
    }

    fn deliver(&self, event: &SyntheticEvent, at_target: bool) {
        let kind = event.kind();
        let ready = {
            let mut data = self.data.get_mut();
            data.deliveries.push(Delivery {
                event: event.clone(),
                at: self.timer.now(),
                at_target,
            });
            let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut data.observers)
                .into_iter()
                .partition(|(observed, _)| *observed == kind);
            data.observers = waiting;
            ready
        };
        // Observers run without the element borrowed, so they may touch it.
        for (_, callback) in ready.into_iter() {
            callback();
        }
    }
}

impl Target for SimElement {
    fn bounding_rect(&self) -> Rect {
        self.rect()
    }

    fn dispatch(&self, event: &SyntheticEvent) -> Result<()> {
        log::trace!("dispatching {:?} on {:?}", event.kind(), self);
        self.deliver(event, true);
        if event.bubbles() {
            let mut next = self.parent();
            while let Some(node) = next {
                node.deliver(event, false);
                next = node.parent();
            }
        }
        Ok(())
    }

    fn observe_once(&self, kind: EventKind, callback: impl FnOnce() + 'static) -> Result<()> {
        self.data
            .get_mut()
            .observers
            .push((kind, Box::new(callback)));
        Ok(())
    }
}

/// An in-memory document: an `<html>` root holding a `<body>`.
#[derive(Clone)]
pub struct SimDocument {
    root: SimElement,
    body: SimElement,
    timer: SimTimer,
}

impl SimDocument {
    pub fn new(timer: &SimTimer) -> Self {
        let root = SimElement::new("html", timer);
        let body = SimElement::new("body", timer);
        root.append_child(&body);
        SimDocument {
            root,
            body,
            timer: timer.clone(),
        }
    }

    /// The `<html>` element.
    pub fn root(&self) -> SimElement {
        self.root.clone()
    }

    pub fn body(&self) -> SimElement {
        self.body.clone()
    }

    pub fn timer(&self) -> &SimTimer {
        &self.timer
    }

    /// Create a detached element. Append it somewhere to make it queryable.
    pub fn create_element(&self, tag: impl AsRef<str>) -> SimElement {
        SimElement::new(tag.as_ref(), &self.timer)
    }

    /// All elements in document order.
    fn elements(&self) -> Vec<SimElement> {
        let mut elements = vec![];
        self.root.collect_subtree(&mut elements);
        elements
    }
}

impl Query for SimDocument {
    type Node = SimElement;

    fn find_first(&self, selector: &str) -> Result<Option<SimElement>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .elements()
            .into_iter()
            .find(|element| selector.matches(element)))
    }

    fn find_all(&self, selector: &str) -> Result<Vec<SimElement>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .elements()
            .into_iter()
            .filter(|element| selector.matches(element))
            .collect())
    }
}
