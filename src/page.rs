use std::collections::VecDeque;

use crate::dom::{Dom, NodeId};
use crate::html;
use crate::{Error, Result};

/// One loaded page view: the document tree plus the platform effects the
/// browser would perform natively.
///
/// Alerts, confirm prompts, reload requests and scroll-into-view requests
/// are recorded rather than executed, and confirm answers are scripted
/// through a queue, so flows driven against a [`Page`] are fully
/// deterministic.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) platform: PlatformState,
}

#[derive(Debug, Default)]
pub(crate) struct PlatformState {
    alerts: Vec<String>,
    confirm_prompts: Vec<String>,
    confirm_responses: VecDeque<bool>,
    default_confirm_response: bool,
    reload_requests: usize,
    scroll_requests: Vec<String>,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Ok(Self {
            dom: html::parse_fragment(html)?,
            platform: PlatformState::default(),
        })
    }

    // ---- document queries ----

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.dom.query_selector(selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    pub fn exists(&self, selector: &str) -> bool {
        matches!(self.dom.query_selector(selector), Ok(Some(_)))
    }

    pub fn text_content(&self, selector: &str) -> Result<String> {
        let node = self.select_one(selector)?;
        Ok(self.dom.text_content(node))
    }

    pub fn inner_html(&self, selector: &str) -> Result<String> {
        let node = self.select_one(selector)?;
        self.dom.inner_html(node)
    }

    pub fn outer_html(&self, selector: &str) -> Result<String> {
        let node = self.select_one(selector)?;
        Ok(self.dom.outer_html(node))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let node = self.select_one(selector)?;
        Ok(self.dom.attr(node, name))
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let node = self.select_one(selector)?;
        Ok(self.dom.has_class(node, class_name))
    }

    /// Hidden by the page convention: the `hidden` utility class.
    pub fn is_hidden(&self, selector: &str) -> Result<bool> {
        self.has_class(selector, "hidden")
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    // ---- form input ----

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let node = self.select_one(selector)?;
        self.dom.set_value(node, text)
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let node = self.select_one(selector)?;
        self.dom.set_checked(node, checked)
    }

    // ---- platform effects ----

    pub(crate) fn alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("alert: {message}");
        self.platform.alerts.push(message);
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.platform.alerts)
    }

    pub(crate) fn confirm(&mut self, prompt: &str) -> bool {
        self.platform.confirm_prompts.push(prompt.to_string());
        self.platform
            .confirm_responses
            .pop_front()
            .unwrap_or(self.platform.default_confirm_response)
    }

    pub fn enqueue_confirm_response(&mut self, accepted: bool) {
        self.platform.confirm_responses.push_back(accepted);
    }

    pub fn set_default_confirm_response(&mut self, accepted: bool) {
        self.platform.default_confirm_response = accepted;
    }

    pub fn take_confirm_prompts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.platform.confirm_prompts)
    }

    pub(crate) fn request_reload(&mut self) {
        log::debug!("full reload requested");
        self.platform.reload_requests += 1;
    }

    pub fn reload_count(&self) -> usize {
        self.platform.reload_requests
    }

    pub(crate) fn scroll_into_view(&mut self, node: NodeId) {
        let label = self
            .dom
            .attr(node, "id")
            .map(|id| format!("#{id}"))
            .or_else(|| self.dom.tag_name(node).map(ToOwned::to_owned))
            .unwrap_or_else(|| "?".to_string());
        self.platform.scroll_requests.push(label);
    }

    pub fn take_scroll_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.platform.scroll_requests)
    }
}
