//! Synchronous extension points of a layout pass.
//!
//! Callbacks are grouped per [`HookEvent`] and run in registration order.
//! Replacement hooks return `None` to keep the current value, or
//! `Some(value)` to substitute it; later hooks see the substituted value.

use crate::fragment::PageFragment;
use crate::region::{Extracted, Overflow};
use crate::token::BreakTokens;
use quire_dom::SourceTree;
use quire_types::{NodeId, PageBounds};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    PageLayout,
    LayoutNode,
    RenderNode,
    Layout,
    Overflow,
    BreakToken,
    AfterOverflowRemoved,
    BeforeRenderResult,
}

/// Lets a `layout_node` hook end the page before the current node.
#[derive(Debug, Default)]
pub struct LayoutControl {
    forced: bool,
}

impl LayoutControl {
    pub fn force_break(&mut self) {
        self.forced = true;
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }
}

pub type PageLayoutFn = dyn FnMut(&mut PageFragment, Option<&BreakTokens>);
pub type LayoutNodeFn = dyn FnMut(&SourceTree, NodeId, &mut LayoutControl);
/// Receives the fragment, the new clone and its source node.
pub type RenderNodeFn = dyn FnMut(&mut PageFragment, NodeId, NodeId);
pub type LayoutFn = dyn FnMut(&mut PageFragment, &PageBounds);
pub type OverflowFn = dyn FnMut(Option<&Overflow>, &PageFragment) -> Option<Option<Overflow>>;
pub type BreakTokenFn =
    dyn FnMut(Option<&BreakTokens>, Option<&Overflow>, &PageFragment) -> Option<Option<BreakTokens>>;
pub type AfterOverflowRemovedFn = dyn FnMut(&[Extracted], &PageFragment);
pub type BeforeRenderResultFn = dyn FnMut(Option<&BreakTokens>, &mut PageFragment);

struct Registration<F: ?Sized> {
    name: String,
    callback: Box<F>,
}

impl<F: ?Sized> Registration<F> {
    fn new(name: &str, callback: Box<F>) -> Self {
        Self {
            name: name.to_string(),
            callback,
        }
    }
}

#[derive(Default)]
pub struct Hooks {
    page_layout: Vec<Registration<PageLayoutFn>>,
    layout_node: Vec<Registration<LayoutNodeFn>>,
    render_node: Vec<Registration<RenderNodeFn>>,
    layout: Vec<Registration<LayoutFn>>,
    overflow: Vec<Registration<OverflowFn>>,
    break_token: Vec<Registration<BreakTokenFn>>,
    after_overflow_removed: Vec<Registration<AfterOverflowRemovedFn>>,
    before_render_result: Vec<Registration<BeforeRenderResultFn>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for event in ALL_EVENTS {
            map.entry(&event, &self.registered(event));
        }
        map.finish()
    }
}

const ALL_EVENTS: [HookEvent; 8] = [
    HookEvent::PageLayout,
    HookEvent::LayoutNode,
    HookEvent::RenderNode,
    HookEvent::Layout,
    HookEvent::Overflow,
    HookEvent::BreakToken,
    HookEvent::AfterOverflowRemoved,
    HookEvent::BeforeRenderResult,
];

fn names<F: ?Sized>(list: &[Registration<F>]) -> Vec<&str> {
    list.iter().map(|r| r.name.as_str()).collect()
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names registered for `event`, in call order.
    pub fn registered(&self, event: HookEvent) -> Vec<&str> {
        match event {
            HookEvent::PageLayout => names(&self.page_layout),
            HookEvent::LayoutNode => names(&self.layout_node),
            HookEvent::RenderNode => names(&self.render_node),
            HookEvent::Layout => names(&self.layout),
            HookEvent::Overflow => names(&self.overflow),
            HookEvent::BreakToken => names(&self.break_token),
            HookEvent::AfterOverflowRemoved => names(&self.after_overflow_removed),
            HookEvent::BeforeRenderResult => names(&self.before_render_result),
        }
    }

    pub fn on_page_layout<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(&mut PageFragment, Option<&BreakTokens>) + 'static,
    {
        self.page_layout.push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn on_layout_node<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(&SourceTree, NodeId, &mut LayoutControl) + 'static,
    {
        self.layout_node.push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn on_render_node<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(&mut PageFragment, NodeId, NodeId) + 'static,
    {
        self.render_node.push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn on_layout<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(&mut PageFragment, &PageBounds) + 'static,
    {
        self.layout.push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn on_overflow<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(Option<&Overflow>, &PageFragment) -> Option<Option<Overflow>> + 'static,
    {
        self.overflow.push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn on_break_token<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(Option<&BreakTokens>, Option<&Overflow>, &PageFragment) -> Option<Option<BreakTokens>>
            + 'static,
    {
        self.break_token.push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn after_overflow_removed<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(&[Extracted], &PageFragment) + 'static,
    {
        self.after_overflow_removed
            .push(Registration::new(name, Box::new(hook)));
        self
    }

    pub fn before_render_result<F>(&mut self, name: &str, hook: F) -> &mut Self
    where
        F: FnMut(Option<&BreakTokens>, &mut PageFragment) + 'static,
    {
        self.before_render_result
            .push(Registration::new(name, Box::new(hook)));
        self
    }

    // --- Dispatch, used by the engine ---

    pub(crate) fn page_layout(&mut self, page: &mut PageFragment, start: Option<&BreakTokens>) {
        for hook in &mut self.page_layout {
            (hook.callback)(page, start);
        }
    }

    pub(crate) fn layout_node(&mut self, source: &SourceTree, node: NodeId, control: &mut LayoutControl) {
        for hook in &mut self.layout_node {
            (hook.callback)(source, node, control);
        }
    }

    pub(crate) fn render_node(&mut self, page: &mut PageFragment, clone: NodeId, source_node: NodeId) {
        for hook in &mut self.render_node {
            (hook.callback)(page, clone, source_node);
        }
    }

    pub(crate) fn layout(&mut self, page: &mut PageFragment, bounds: &PageBounds) {
        for hook in &mut self.layout {
            (hook.callback)(page, bounds);
        }
    }

    pub(crate) fn overflow(&mut self, mut overflow: Option<Overflow>, page: &PageFragment) -> Option<Overflow> {
        for hook in &mut self.overflow {
            if let Some(replacement) = (hook.callback)(overflow.as_ref(), page) {
                log::debug!("Hook '{}' replaced the overflow", hook.name);
                overflow = replacement;
            }
        }
        overflow
    }

    pub(crate) fn break_token(
        &mut self,
        mut tokens: Option<BreakTokens>,
        overflow: Option<&Overflow>,
        page: &PageFragment,
    ) -> Option<BreakTokens> {
        for hook in &mut self.break_token {
            if let Some(replacement) = (hook.callback)(tokens.as_ref(), overflow, page) {
                log::debug!("Hook '{}' replaced the break token", hook.name);
                tokens = replacement;
            }
        }
        tokens
    }

    pub(crate) fn overflow_removed(&mut self, removed: &[Extracted], page: &PageFragment) {
        for hook in &mut self.after_overflow_removed {
            (hook.callback)(removed, page);
        }
    }

    pub(crate) fn render_result(&mut self, tokens: Option<&BreakTokens>, page: &mut PageFragment) {
        for hook in &mut self.before_render_result {
            (hook.callback)(tokens, page);
        }
    }
}
