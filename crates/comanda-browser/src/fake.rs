//! Scripted in-memory browser for tests.
//!
//! Pages are flat lists of nodes. A node answers to the selector keys it was
//! registered with (the `Display` form of [`Strategy`]), so tests and
//! production code share the same strategy definitions. Click effects mutate
//! the shared page state, which is enough to script multi-step flows like
//! login, overlay dialogs and transient click rejections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::dom::{Browser, BoxedElement, Element};
use crate::error::DriverError;
use crate::locator::Strategy;

/// What happens when a node is activated.
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Activation is recorded and nothing else changes.
    None,
    /// Navigates the browser to this URL.
    Goto(String),
    /// Makes the node with this id visible.
    Show(String),
    /// Hides the node with this id.
    Hide(String),
    /// Replaces the text of the node with this id.
    SetText { id: String, text: String },
    /// Rejects the next N activation attempts, then behaves as `None`.
    FailTimes(u32),
    /// Applies several effects in order.
    Seq(Vec<ClickEffect>),
}

/// One scripted DOM node.
#[derive(Debug, Clone)]
pub struct FakeNode {
    id: String,
    selectors: Vec<String>,
    text: String,
    attrs: HashMap<String, String>,
    value: String,
    displayed: bool,
    enabled: bool,
    reject_keystrokes: bool,
    effect: ClickEffect,
    fail_remaining: u32,
    clicks: u32,
    enter_presses: u32,
    escape_presses: u32,
}

impl FakeNode {
    #[must_use]
    pub fn new(id: &str, selectors: &[&str]) -> Self {
        FakeNode {
            id: id.to_string(),
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            text: String::new(),
            attrs: HashMap::new(),
            value: String::new(),
            displayed: true,
            enabled: true,
            reject_keystrokes: false,
            effect: ClickEffect::None,
            fail_remaining: 0,
            clicks: 0,
            enter_presses: 0,
            escape_presses: 0,
        }
    }

    /// Registers the node under a strategy's selector key.
    #[must_use]
    pub fn matching(mut self, strategy: &Strategy) -> Self {
        self.selectors.push(strategy.to_string());
        self
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Typed text is dropped instead of stored; `script_set_value` still
    /// lands. Models inputs that swallow synthetic keystrokes.
    #[must_use]
    pub fn rejecting_keystrokes(mut self) -> Self {
        self.reject_keystrokes = true;
        self
    }

    #[must_use]
    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        if let ClickEffect::FailTimes(n) = effect {
            self.fail_remaining = n;
        }
        self.effect = effect;
        self
    }
}

/// One scripted page, keyed by URL.
#[derive(Debug, Clone)]
pub struct FakePage {
    url: String,
    nodes: Vec<FakeNode>,
    source: String,
}

impl FakePage {
    #[must_use]
    pub fn new(url: &str, nodes: Vec<FakeNode>) -> Self {
        FakePage {
            url: url.to_string(),
            nodes,
            source: String::new(),
        }
    }

    /// HTML returned by `page_source` while this page is current.
    #[must_use]
    pub fn source(mut self, html: &str) -> Self {
        self.source = html.to_string();
        self
    }
}

struct FakeState {
    pages: Vec<FakePage>,
    current_url: String,
    closed: bool,
    screenshot: Vec<u8>,
}

/// Scripted [`Browser`] implementation.
#[derive(Clone)]
pub struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
    #[must_use]
    pub fn new(pages: Vec<FakePage>, start_url: &str) -> Self {
        FakeBrowser {
            state: Arc::new(Mutex::new(FakeState {
                pages,
                current_url: start_url.to_string(),
                closed: false,
                screenshot: vec![0x89, b'P', b'N', b'G'],
            })),
        }
    }

    #[must_use]
    pub fn single_page(url: &str, nodes: Vec<FakeNode>) -> Self {
        FakeBrowser::new(vec![FakePage::new(url, nodes)], url)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Successful activations of a node, by any click method.
    #[must_use]
    pub fn clicks(&self, id: &str) -> u32 {
        self.node_stat(id, |n| n.clicks)
    }

    /// Enter presses delivered to a node.
    #[must_use]
    pub fn enter_presses(&self, id: &str) -> u32 {
        self.node_stat(id, |n| n.enter_presses)
    }

    /// Escape presses delivered to a node.
    #[must_use]
    pub fn escape_presses(&self, id: &str) -> u32 {
        self.node_stat(id, |n| n.escape_presses)
    }

    /// Text typed into a node since the last clear.
    #[must_use]
    pub fn typed(&self, id: &str) -> String {
        let state = self.lock();
        state
            .pages
            .iter()
            .flat_map(|p| &p.nodes)
            .find(|n| n.id == id)
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn node_stat(&self, id: &str, read: impl Fn(&FakeNode) -> u32) -> u32 {
        let state = self.lock();
        state
            .pages
            .iter()
            .flat_map(|p| &p.nodes)
            .find(|n| n.id == id)
            .map(read)
            .unwrap_or(0)
    }

    fn find_indices(&self, key: &str) -> Result<Vec<(usize, usize)>, DriverError> {
        let state = self.lock();
        if state.closed {
            return Err(DriverError::Session("session closed".to_string()));
        }
        let Some(page_idx) = state.pages.iter().position(|p| p.url == state.current_url) else {
            return Ok(vec![]);
        };
        Ok(state.pages[page_idx]
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.selectors.iter().any(|s| s == key))
            .map(|(node_idx, _)| (page_idx, node_idx))
            .collect())
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        if state.closed {
            return Err(DriverError::Session("session closed".to_string()));
        }
        state.current_url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.lock().current_url.clone())
    }

    async fn find(&self, strategy: &Strategy) -> Result<BoxedElement, DriverError> {
        let key = strategy.to_string();
        let matches = self.find_indices(&key)?;
        match matches.first() {
            Some(&(page, node)) => Ok(Box::new(FakeElement {
                state: Arc::clone(&self.state),
                page,
                node,
            })),
            None => Err(DriverError::NotFound { selector: key }),
        }
    }

    async fn find_all(&self, strategy: &Strategy) -> Result<Vec<BoxedElement>, DriverError> {
        let matches = self.find_indices(&strategy.to_string())?;
        Ok(matches
            .into_iter()
            .map(|(page, node)| {
                Box::new(FakeElement {
                    state: Arc::clone(&self.state),
                    page,
                    node,
                }) as BoxedElement
            })
            .collect())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        let state = self.lock();
        if state.closed {
            return Err(DriverError::Session("session closed".to_string()));
        }
        Ok(state
            .pages
            .iter()
            .find(|p| p.url == state.current_url)
            .map(|p| p.source.clone())
            .unwrap_or_default())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError> {
        Ok(self.lock().screenshot.clone())
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

struct FakeElement {
    state: Arc<Mutex<FakeState>>,
    page: usize,
    node: usize,
}

impl FakeElement {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read<T>(&self, read: impl Fn(&FakeNode) -> T) -> Result<T, DriverError> {
        let state = self.lock();
        if state.closed {
            return Err(DriverError::Session("session closed".to_string()));
        }
        Ok(read(&state.pages[self.page].nodes[self.node]))
    }

    fn activate(&self) -> Result<(), DriverError> {
        let mut state = self.lock();
        if state.closed {
            return Err(DriverError::Session("session closed".to_string()));
        }

        {
            let node = &mut state.pages[self.page].nodes[self.node];
            if node.fail_remaining > 0 {
                node.fail_remaining = node.fail_remaining.saturating_sub(1);
                return Err(DriverError::Session(format!(
                    "element {} is not clickable",
                    node.id
                )));
            }
            node.clicks += 1;
        }

        let effect = state.pages[self.page].nodes[self.node].effect.clone();
        apply_effect(&mut state, &effect);
        Ok(())
    }
}

fn apply_effect(state: &mut FakeState, effect: &ClickEffect) {
    match effect {
        ClickEffect::None | ClickEffect::FailTimes(_) => {}
        ClickEffect::Goto(url) => state.current_url.clone_from(url),
        ClickEffect::Show(id) => set_displayed(state, id, true),
        ClickEffect::Hide(id) => set_displayed(state, id, false),
        ClickEffect::SetText { id, text } => {
            for node in state.pages.iter_mut().flat_map(|p| &mut p.nodes) {
                if &node.id == id {
                    node.text.clone_from(text);
                }
            }
        }
        ClickEffect::Seq(effects) => {
            for e in effects {
                apply_effect(state, e);
            }
        }
    }
}

fn set_displayed(state: &mut FakeState, id: &str, displayed: bool) {
    for node in state.pages.iter_mut().flat_map(|p| &mut p.nodes) {
        if node.id == id {
            node.displayed = displayed;
        }
    }
}

#[async_trait]
impl Element for FakeElement {
    async fn click(&self) -> Result<(), DriverError> {
        self.activate()
    }

    async fn script_click(&self) -> Result<(), DriverError> {
        self.activate()
    }

    async fn clear(&self) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.pages[self.page].nodes[self.node].value.clear();
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        let node = &mut state.pages[self.page].nodes[self.node];
        if !node.reject_keystrokes {
            node.value.push_str(text);
        }
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), DriverError> {
        {
            let mut state = self.lock();
            state.pages[self.page].nodes[self.node].enter_presses += 1;
        }
        self.activate()
    }

    async fn press_escape(&self) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.pages[self.page].nodes[self.node].escape_presses += 1;
        Ok(())
    }

    async fn script_set_value(&self, value: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.pages[self.page].nodes[self.node].value = value.to_string();
        Ok(())
    }

    async fn text(&self) -> Result<String, DriverError> {
        self.read(|n| n.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError> {
        // Attributes are static markup; typed text only shows up via prop.
        self.read(|n| n.attrs.get(name).cloned())
    }

    async fn prop(&self, name: &str) -> Result<Option<String>, DriverError> {
        if name == "value" {
            return self.read(|n| Some(n.value.clone()));
        }
        self.read(|n| n.attrs.get(name).cloned())
    }

    async fn is_displayed(&self) -> Result<bool, DriverError> {
        self.read(|n| n.displayed)
    }

    async fn is_enabled(&self) -> Result<bool, DriverError> {
        self.read(|n| n.enabled)
    }
}
