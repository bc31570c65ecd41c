use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::trace;

use super::{ClickEvent, ClickListener, ElementId, Page};

/// Headless page: an element tree kept in memory.
///
/// Fades run on the ambient tokio runtime; without one (or with a zero fade)
/// elements are detached immediately.
#[derive(Clone, Default)]
pub struct MemoryPage {
    dom: Arc<Mutex<Dom>>,
}

#[derive(Default)]
struct Dom {
    next_id: u64,
    nodes: BTreeMap<ElementId, Node>,
    body: Vec<ElementId>,
    body_clicks: usize,
}

struct Node {
    template: String,
    dom_id: Option<String>,
    content: String,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    listeners: Vec<ClickListener>,
    parent: Option<Parent>,
    children: Vec<ElementId>,
    fading: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Parent {
    Body,
    Element(ElementId),
}

#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub body: Vec<ElementSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementSnapshot {
    pub element: ElementId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub style: BTreeMap<String, String>,
    pub content: String,
    pub clickable: bool,
    pub fading: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSnapshot>,
}

impl Dom {
    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(&element)
    }

    fn is_attached(&self, element: ElementId) -> bool {
        let mut current = element;
        loop {
            match self.node(current).and_then(|node| node.parent) {
                Some(Parent::Body) => return true,
                Some(Parent::Element(parent)) => current = parent,
                None => return false,
            }
        }
    }

    fn unlink(&mut self, element: ElementId) {
        let Some(parent) = self.nodes.get_mut(&element).and_then(|node| node.parent.take()) else {
            return;
        };
        match parent {
            Parent::Body => self.body.retain(|id| *id != element),
            Parent::Element(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.retain(|id| *id != element);
                }
            }
        }
    }

    /// Unlink `element` and free its whole subtree.
    fn detach(&mut self, element: ElementId) {
        self.unlink(element);
        let mut pending = vec![element];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.children);
            }
        }
    }

    fn snapshot(&self, element: ElementId) -> Option<ElementSnapshot> {
        let node = self.node(element)?;
        Some(ElementSnapshot {
            element,
            id: node.dom_id.clone(),
            classes: node.classes.clone(),
            style: node.style.clone(),
            content: node.content.clone(),
            clickable: !node.listeners.is_empty(),
            fading: node.fading,
            children: node
                .children
                .iter()
                .filter_map(|child| self.snapshot(*child))
                .collect(),
        })
    }
}

impl MemoryPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a click on `element`, bubbling up to the body unless a
    /// listener stops propagation.
    pub fn click(&self, element: ElementId) {
        let (chain, reaches_body) = {
            let dom = self.dom.lock();
            let mut chain = Vec::new();
            let mut current = Some(element);
            let mut reaches_body = false;
            while let Some(id) = current {
                let Some(node) = dom.node(id) else { break };
                chain.push(node.listeners.clone());
                current = match node.parent {
                    Some(Parent::Element(parent)) => Some(parent),
                    Some(Parent::Body) => {
                        reaches_body = true;
                        None
                    }
                    None => None,
                };
            }
            (chain, reaches_body)
        };

        let mut event = ClickEvent::default();
        for listeners in chain {
            for listener in listeners {
                listener(&mut event);
            }
            if event.is_propagation_stopped() {
                trace!(%element, "click propagation stopped");
                return;
            }
        }
        if reaches_body {
            self.dom.lock().body_clicks += 1;
        }
    }

    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.dom.lock().is_attached(element)
    }

    #[must_use]
    pub fn is_fading(&self, element: ElementId) -> bool {
        self.dom.lock().node(element).is_some_and(|node| node.fading)
    }

    #[must_use]
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.dom
            .lock()
            .node(element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn body_children(&self) -> Vec<ElementId> {
        self.dom.lock().body.clone()
    }

    #[must_use]
    pub fn content(&self, element: ElementId) -> Option<String> {
        self.dom.lock().node(element).map(|node| node.content.clone())
    }

    #[must_use]
    pub fn template(&self, element: ElementId) -> Option<String> {
        self.dom
            .lock()
            .node(element)
            .map(|node| node.template.clone())
    }

    #[must_use]
    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.dom
            .lock()
            .node(element)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    #[must_use]
    pub fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.dom
            .lock()
            .node(element)
            .and_then(|node| node.style.get(property).cloned())
    }

    #[must_use]
    pub fn listener_count(&self, element: ElementId) -> usize {
        self.dom
            .lock()
            .node(element)
            .map_or(0, |node| node.listeners.len())
    }

    /// Elements currently held by the page, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dom.lock().nodes.len()
    }

    /// Number of attached elements carrying `id`.
    #[must_use]
    pub fn count_by_id(&self, id: &str) -> usize {
        let dom = self.dom.lock();
        dom.nodes
            .iter()
            .filter(|(element, node)| {
                node.dom_id.as_deref() == Some(id) && dom.is_attached(**element)
            })
            .count()
    }

    /// Clicks that bubbled all the way up to the body.
    #[must_use]
    pub fn body_clicks(&self) -> usize {
        self.dom.lock().body_clicks
    }

    #[must_use]
    pub fn snapshot(&self) -> PageSnapshot {
        let dom = self.dom.lock();
        PageSnapshot {
            body: dom
                .body
                .iter()
                .filter_map(|element| dom.snapshot(*element))
                .collect(),
        }
    }
}

impl Page for MemoryPage {
    fn find_by_id(&self, id: &str) -> Option<ElementId> {
        let dom = self.dom.lock();
        dom.nodes
            .iter()
            .find(|(element, node)| {
                node.dom_id.as_deref() == Some(id) && dom.is_attached(**element)
            })
            .map(|(element, _)| *element)
    }

    fn instantiate(&self, template: &str) -> ElementId {
        let mut dom = self.dom.lock();
        dom.next_id += 1;
        let element = ElementId::new(dom.next_id);
        dom.nodes.insert(
            element,
            Node {
                template: template.to_string(),
                dom_id: None,
                content: String::new(),
                classes: Vec::new(),
                style: BTreeMap::new(),
                listeners: Vec::new(),
                parent: None,
                children: Vec::new(),
                fading: false,
            },
        );
        element
    }

    fn set_id(&self, element: ElementId, id: &str) {
        if let Some(node) = self.dom.lock().nodes.get_mut(&element) {
            node.dom_id = Some(id.to_string());
        }
    }

    fn set_content(&self, element: ElementId, content: &str) {
        if let Some(node) = self.dom.lock().nodes.get_mut(&element) {
            node.content = content.to_string();
        }
    }

    fn apply_style(&self, element: ElementId, style: &[(&str, &str)]) {
        if let Some(node) = self.dom.lock().nodes.get_mut(&element) {
            for (property, value) in style {
                node.style.insert((*property).to_string(), (*value).to_string());
            }
        }
    }

    fn add_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.dom.lock().nodes.get_mut(&element) {
            for class in class.split_whitespace() {
                if !node.classes.iter().any(|c| c == class) {
                    node.classes.push(class.to_string());
                }
            }
        }
    }

    fn on_click(&self, element: ElementId, listener: ClickListener) {
        if let Some(node) = self.dom.lock().nodes.get_mut(&element) {
            node.listeners.push(listener);
        }
    }

    fn append_to_body(&self, element: ElementId) {
        let mut dom = self.dom.lock();
        if !dom.nodes.contains_key(&element) {
            return;
        }
        dom.unlink(element);
        dom.body.push(element);
        if let Some(node) = dom.nodes.get_mut(&element) {
            node.parent = Some(Parent::Body);
        }
    }

    fn append_child(&self, parent: ElementId, child: ElementId) {
        let mut dom = self.dom.lock();
        if parent == child || !dom.nodes.contains_key(&parent) || !dom.nodes.contains_key(&child) {
            return;
        }
        dom.unlink(child);
        if let Some(node) = dom.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = dom.nodes.get_mut(&child) {
            node.parent = Some(Parent::Element(parent));
        }
    }

    fn child_count(&self, element: ElementId) -> usize {
        self.dom
            .lock()
            .node(element)
            .map_or(0, |node| node.children.len())
    }

    fn contains(&self, parent: ElementId, child: ElementId) -> bool {
        self.dom
            .lock()
            .node(child)
            .is_some_and(|node| node.parent == Some(Parent::Element(parent)))
    }

    fn fade_out_and_detach(&self, element: ElementId, fade: Duration) {
        {
            let mut dom = self.dom.lock();
            let Some(node) = dom.nodes.get_mut(&element) else {
                return;
            };
            if node.parent.is_none() || node.fading {
                return;
            }
            let immediate = fade.is_zero();
            if !immediate {
                node.fading = true;
            }
            if immediate {
                dom.detach(element);
                return;
            }
        }

        match Handle::try_current() {
            Ok(handle) => {
                let dom = Arc::clone(&self.dom);
                handle.spawn(async move {
                    tokio::time::sleep(fade).await;
                    dom.lock().detach(element);
                });
            }
            Err(_) => self.dom.lock().detach(element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryPage;
    use crate::page::{ClickListener, Page};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter_listener(counter: &Arc<AtomicUsize>, stop: bool) -> ClickListener {
        let counter = Arc::clone(counter);
        Arc::new(move |event| {
            counter.fetch_add(1, Ordering::SeqCst);
            if stop {
                event.stop_propagation();
            }
        })
    }

    #[test]
    fn find_by_id_ignores_detached_elements() {
        let page = MemoryPage::new();
        let el = page.instantiate("<div></div>");
        page.set_id(el, "box");
        assert_eq!(page.find_by_id("box"), None);
        page.append_to_body(el);
        assert_eq!(page.find_by_id("box"), Some(el));
        page.fade_out_and_detach(el, Duration::ZERO);
        assert_eq!(page.find_by_id("box"), None);
    }

    #[test]
    fn click_bubbles_until_stopped() {
        let page = MemoryPage::new();
        let outer = page.instantiate("<div></div>");
        let inner = page.instantiate("<div></div>");
        page.append_to_body(outer);
        page.append_child(outer, inner);

        let outer_hits = Arc::new(AtomicUsize::new(0));
        let inner_hits = Arc::new(AtomicUsize::new(0));
        page.on_click(outer, counter_listener(&outer_hits, false));
        page.on_click(inner, counter_listener(&inner_hits, false));

        page.click(inner);
        assert_eq!(inner_hits.load(Ordering::SeqCst), 1);
        assert_eq!(outer_hits.load(Ordering::SeqCst), 1);
        assert_eq!(page.body_clicks(), 1);

        page.on_click(inner, counter_listener(&inner_hits, true));
        page.click(inner);
        assert_eq!(inner_hits.load(Ordering::SeqCst), 3);
        assert_eq!(outer_hits.load(Ordering::SeqCst), 1);
        assert_eq!(page.body_clicks(), 1);
    }

    #[test]
    fn detach_drops_listeners_and_is_repeatable() {
        let page = MemoryPage::new();
        let el = page.instantiate("<div></div>");
        page.append_to_body(el);
        page.on_click(el, Arc::new(|_| {}));
        page.fade_out_and_detach(el, Duration::ZERO);
        page.fade_out_and_detach(el, Duration::ZERO);
        assert!(!page.is_attached(el));
        assert_eq!(page.listener_count(el), 0);
        assert!(page.body_children().is_empty());
        assert_eq!(page.node_count(), 0);
    }

    #[test]
    fn detaching_a_parent_frees_its_subtree() {
        let page = MemoryPage::new();
        let parent = page.instantiate("<div></div>");
        let child = page.instantiate("<p></p>");
        page.append_to_body(parent);
        page.append_child(parent, child);
        assert_eq!(page.node_count(), 2);

        page.fade_out_and_detach(parent, Duration::ZERO);
        assert_eq!(page.node_count(), 0);
        assert_eq!(page.content(child), None);
        page.fade_out_and_detach(child, Duration::ZERO);
        assert_eq!(page.node_count(), 0);
    }

    #[test]
    fn add_class_splits_and_dedups() {
        let page = MemoryPage::new();
        let el = page.instantiate("<div></div>");
        page.add_class(el, "a b");
        page.add_class(el, "b");
        assert!(page.has_class(el, "a"));
        assert!(page.has_class(el, "b"));
        assert_eq!(page.snapshot().body.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fade_detaches_after_delay() {
        let page = MemoryPage::new();
        let parent = page.instantiate("<div></div>");
        let child = page.instantiate("<p></p>");
        page.append_to_body(parent);
        page.append_child(parent, child);

        page.fade_out_and_detach(child, Duration::from_millis(200));
        assert!(page.is_fading(child));
        assert_eq!(page.child_count(parent), 1);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!page.is_attached(child));
        assert_eq!(page.child_count(parent), 0);
        assert!(!page.is_fading(child));
    }
}
