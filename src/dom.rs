use std::collections::HashMap;

use crate::selector;
use crate::{Error, Result};

/// Handle into the arena. Stable for the lifetime of the [`Dom`]; removal
/// detaches a node but never invalidates handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Insertion point relative to a target element, mirroring the four
/// `insertAdjacentHTML` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// Attributes keep insertion order so serialization is deterministic and
/// round-trips source order.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub(crate) fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let element = Element { tag_name, attrs };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self.attr(id, "id") {
            self.id_index.entry(id_attr).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        &self.nodes[node_id.0].children
    }

    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        self.id_index.clear();
        let mut stack = vec![self.root];
        // Depth-first in document order; the first element claiming an id wins.
        while let Some(node) = stack.pop() {
            if let Some(id_attr) = self.attr(node, "id") {
                self.id_index.entry(id_attr).or_insert(node);
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attr(name))
            .map(ToOwned::to_owned)
    }

    pub(crate) fn has_attr(&self, node_id: NodeId, name: &str) -> bool {
        self.element(node_id)
            .map(|e| e.attr(name).is_some())
            .unwrap_or(false)
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("setAttribute target is not an element".into()))?;
        element.set_attr(&lowered, value);
        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("removeAttribute target is not an element".into()))?;
        element.remove_attr(&lowered);
        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn has_class(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .and_then(|e| e.attr("class"))
            .map(|classes| classes.split_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }

    pub(crate) fn add_class(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut tokens = class_tokens(element.attr("class"));
        if !tokens.iter().any(|token| token == class_name) {
            tokens.push(class_name.to_string());
        }
        set_class_attr(element, &tokens);
        Ok(())
    }

    pub(crate) fn remove_class(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut tokens = class_tokens(element.attr("class"));
        tokens.retain(|token| token != class_name);
        set_class_attr(element, &tokens);
        Ok(())
    }

    /// `classList.toggle(name, force)` with an explicit force flag.
    pub(crate) fn toggle_class(&mut self, node_id: NodeId, class_name: &str, on: bool) -> Result<()> {
        if on {
            self.add_class(node_id, class_name)
        } else {
            self.remove_class(node_id, class_name)
        }
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("textContent target is not an element".into()));
        }
        self.detach_children(node_id);
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn inner_html(&self, node_id: NodeId) -> Result<String> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("innerHTML target is not an element".into()));
        }
        let mut out = String::new();
        for child in &self.nodes[node_id.0].children {
            out.push_str(&self.serialize_node(*child));
        }
        Ok(out)
    }

    pub(crate) fn set_inner_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("innerHTML target is not an element".into()));
        }
        let fragment = crate::html::parse_fragment(html)?;

        self.detach_children(node_id);
        let top_level = fragment.nodes[fragment.root.0].children.clone();
        for child in top_level {
            self.adopt_sanitized_subtree(&fragment, child, node_id)?;
        }

        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn outer_html(&self, node_id: NodeId) -> String {
        self.serialize_node(node_id)
    }

    /// Replaces the target element with the parsed fragment, like assigning
    /// `outerHTML` on a connected element.
    pub(crate) fn replace_outer_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        let parent = self
            .parent(node_id)
            .ok_or_else(|| Error::Dom("outerHTML target is detached".into()))?;
        let fragment = crate::html::parse_fragment(html)?;

        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == node_id)
            .ok_or_else(|| Error::Dom("outerHTML target is not in its parent".into()))?;

        self.nodes[parent.0].children.remove(position);
        self.nodes[node_id.0].parent = None;

        let top_level = fragment.nodes[fragment.root.0].children.clone();
        let mut insert_at = position;
        for child in top_level {
            if let Some(adopted) = self.adopt_sanitized_detached(&fragment, child)? {
                self.nodes[adopted.0].parent = Some(parent);
                self.nodes[parent.0].children.insert(insert_at, adopted);
                insert_at += 1;
            }
        }

        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn insert_adjacent_html(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        html: &str,
    ) -> Result<()> {
        if self.element(target).is_none() {
            return Err(Error::Dom("insertAdjacentHTML target is not an element".into()));
        }
        let fragment = crate::html::parse_fragment(html)?;
        let top_level = fragment.nodes[fragment.root.0].children.clone();

        // Resolve the anchor once so multiple top-level fragment children keep
        // their relative order.
        let anchor = match position {
            InsertPosition::AfterBegin => self.nodes[target.0].children.first().copied(),
            InsertPosition::AfterEnd => self.next_sibling(target),
            InsertPosition::BeforeBegin | InsertPosition::BeforeEnd => None,
        };

        for child in top_level {
            let Some(adopted) = self.adopt_sanitized_detached(&fragment, child)? else {
                continue;
            };
            match position {
                InsertPosition::BeforeBegin => {
                    let parent = self
                        .parent(target)
                        .ok_or_else(|| Error::Dom("beforebegin target is detached".into()))?;
                    self.insert_before(parent, adopted, Some(target))?;
                }
                InsertPosition::AfterBegin => {
                    self.insert_before(target, adopted, anchor)?;
                }
                InsertPosition::BeforeEnd => {
                    self.insert_before(target, adopted, None)?;
                }
                InsertPosition::AfterEnd => {
                    let parent = self
                        .parent(target)
                        .ok_or_else(|| Error::Dom("afterend target is detached".into()))?;
                    self.insert_before(parent, adopted, anchor)?;
                }
            }
        }

        self.rebuild_id_index();
        Ok(())
    }

    /// Inserts `child` under `parent`, before `reference` when given, else at
    /// the end. The child is detached from any previous parent first.
    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if child == self.root || child == parent {
            return Err(Error::Dom("invalid insertion node".into()));
        }
        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Dom("insertion would create a cycle".into()));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }

        let index = match reference {
            Some(reference) => self.nodes[parent.0]
                .children
                .iter()
                .position(|id| *id == reference)
                .ok_or_else(|| Error::Dom("insertion reference is not a direct child".into()))?,
            None => self.nodes[parent.0].children.len(),
        };

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::Dom("cannot remove document root".into()));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|id| *id != node);
        self.nodes[node.0].parent = None;
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn first_element_child(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0]
            .children
            .iter()
            .copied()
            .find(|child| self.element(*child).is_some())
    }

    pub(crate) fn next_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = &self.nodes[parent.0].children;
        let position = siblings.iter().position(|id| *id == node_id)?;
        siblings.get(position + 1).copied()
    }

    /// `element.closest(selector)`: the element itself or its nearest
    /// ancestor matching the selector.
    pub(crate) fn closest(&self, node_id: NodeId, selector_src: &str) -> Result<Option<NodeId>> {
        let groups = selector::parse_selector_groups(selector_src)?;
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if self.element(node).is_some() && selector::matches_any(self, node, &groups) {
                return Ok(Some(node));
            }
            cursor = self.parent(node);
        }
        Ok(None)
    }

    pub(crate) fn query_selector(&self, selector_src: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector_src)?.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector_src: &str) -> Result<Vec<NodeId>> {
        let groups = selector::parse_selector_groups(selector_src)?;
        let mut out = Vec::new();
        self.collect_matches(self.root, &groups, &mut out);
        Ok(out)
    }

    fn collect_matches(&self, node: NodeId, groups: &[Vec<selector::SelectorStep>], out: &mut Vec<NodeId>) {
        for child in &self.nodes[node.0].children {
            if self.element(*child).is_some() && selector::matches_any(self, *child, groups) {
                out.push(*child);
            }
            self.collect_matches(*child, groups, out);
        }
    }

    // ---- form control values ----

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        let tag = self
            .tag_name(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?
            .to_ascii_lowercase();
        match tag.as_str() {
            "textarea" => Ok(self.text_content(node_id)),
            "select" => self.select_value(node_id),
            _ => Ok(self.attr(node_id, "value").unwrap_or_default()),
        }
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let tag = self
            .tag_name(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?
            .to_ascii_lowercase();
        match tag.as_str() {
            "textarea" => self.set_text_content(node_id, value),
            "select" => self.set_select_value(node_id, value),
            _ => self.set_attr(node_id, "value", value),
        }
    }

    pub(crate) fn is_checked(&self, node_id: NodeId) -> bool {
        self.has_attr(node_id, "checked")
    }

    pub(crate) fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<()> {
        if checked {
            self.set_attr(node_id, "checked", "")
        } else {
            self.remove_attr(node_id, "checked")
        }
    }

    fn select_value(&self, select: NodeId) -> Result<String> {
        let mut options = Vec::new();
        self.collect_by_tag(select, "option", &mut options);
        if options.is_empty() {
            return Ok(String::new());
        }
        let chosen = options
            .iter()
            .copied()
            .find(|option| self.has_attr(*option, "selected"))
            .unwrap_or(options[0]);
        Ok(self
            .attr(chosen, "value")
            .unwrap_or_else(|| self.text_content(chosen)))
    }

    fn set_select_value(&mut self, select: NodeId, requested: &str) -> Result<()> {
        let mut options = Vec::new();
        self.collect_by_tag(select, "option", &mut options);
        for option in options {
            let effective = self
                .attr(option, "value")
                .unwrap_or_else(|| self.text_content(option));
            if effective == requested {
                self.set_attr(option, "selected", "")?;
            } else {
                self.remove_attr(option, "selected")?;
            }
        }
        Ok(())
    }

    pub(crate) fn collect_by_tag(&self, node: NodeId, tag: &str, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node.0].children {
            if self
                .tag_name(*child)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
            {
                out.push(*child);
            }
            self.collect_by_tag(*child, tag, out);
        }
    }

    // ---- fragment adoption ----

    fn detach_children(&mut self, node_id: NodeId) {
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
    }

    fn adopt_sanitized_subtree(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: NodeId,
    ) -> Result<Option<NodeId>> {
        let Some(adopted) = self.adopt_sanitized_detached(source, source_node)? else {
            return Ok(None);
        };
        self.nodes[adopted.0].parent = Some(parent);
        self.nodes[parent.0].children.push(adopted);
        Ok(Some(adopted))
    }

    /// Clones a subtree out of a parsed fragment, dropping script elements
    /// and event-handler / javascript-URL attributes on the way in.
    fn adopt_sanitized_detached(
        &mut self,
        source: &Dom,
        source_node: NodeId,
    ) -> Result<Option<NodeId>> {
        let node_type = match &source.nodes[source_node.0].node_type {
            NodeType::Document => {
                return Err(Error::Dom("cannot adopt a document node".into()));
            }
            NodeType::Element(element) => {
                if element.tag_name.eq_ignore_ascii_case("script") {
                    return Ok(None);
                }
                let mut element = element.clone();
                sanitize_element_attrs(&mut element);
                NodeType::Element(element)
            }
            NodeType::Text(text) => NodeType::Text(text.clone()),
        };

        let node = self.create_node(None, node_type);
        for child in &source.nodes[source_node.0].children {
            if let Some(adopted) = self.adopt_sanitized_detached(source, *child)? {
                self.nodes[adopted.0].parent = Some(node);
                self.nodes[node.0].children.push(adopted);
            }
        }
        Ok(Some(node))
    }

    // ---- serialization ----

    pub(crate) fn serialize_node(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.serialize_node(*child));
                }
                out
            }
            NodeType::Text(text) => escape_text(text),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if crate::html::is_void_tag(&element.tag_name) {
                    return out;
                }
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.serialize_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }
}

pub(crate) fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

pub(crate) fn set_class_attr(element: &mut Element, classes: &[String]) {
    if classes.is_empty() {
        element.remove_attr("class");
    } else {
        element.set_attr("class", &classes.join(" "));
    }
}

fn sanitize_element_attrs(element: &mut Element) {
    element.attrs.retain(|(name, value)| {
        if name.starts_with("on") {
            return false;
        }
        if is_javascript_url_attr(name) && is_javascript_scheme(value) {
            return false;
        }
        true
    });
}

fn is_javascript_url_attr(name: &str) -> bool {
    matches!(name, "href" | "src" | "action" | "formaction")
}

fn is_javascript_scheme(value: &str) -> bool {
    let mut normalized = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_whitespace() || ch.is_ascii_control() {
            continue;
        }
        normalized.push(ch.to_ascii_lowercase());
    }
    normalized.starts_with("javascript:")
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_fragment;

    fn dom_from(html: &str) -> Dom {
        parse_fragment(html).expect("fixture html should parse")
    }

    #[test]
    fn id_index_tracks_set_inner_html() -> crate::Result<()> {
        let mut dom = dom_from(r#"<div id="box"><span id="old">O</span></div>"#);
        let boxed = dom.by_id("box").expect("box exists");
        dom.set_inner_html(boxed, r#"<span id="new">N</span><b>B</b>"#)?;

        assert!(dom.by_id("old").is_none());
        assert!(dom.by_id("new").is_some());
        assert_eq!(dom.inner_html(boxed)?, r#"<span id="new">N</span><b>B</b>"#);
        assert_eq!(dom.text_content(boxed), "NB");
        Ok(())
    }

    #[test]
    fn insert_adjacent_afterbegin_prepends_and_keeps_fragment_order() -> crate::Result<()> {
        let mut dom = dom_from(r#"<ul id="list"><li id="c">C</li></ul>"#);
        let list = dom.by_id("list").expect("list exists");
        dom.insert_adjacent_html(list, InsertPosition::AfterBegin, r#"<li id="a">A</li><li id="b">B</li>"#)?;
        dom.insert_adjacent_html(list, InsertPosition::BeforeEnd, r#"<li id="d">D</li>"#)?;
        assert_eq!(dom.text_content(list), "ABCD");
        assert_eq!(dom.first_element_child(list), dom.by_id("a"));
        Ok(())
    }

    #[test]
    fn insert_adjacent_outside_positions_use_the_parent() -> crate::Result<()> {
        let mut dom = dom_from(r#"<div id="host"><span id="mid">M</span></div>"#);
        let mid = dom.by_id("mid").expect("mid exists");
        dom.insert_adjacent_html(mid, InsertPosition::BeforeBegin, "<i>L</i>")?;
        dom.insert_adjacent_html(mid, InsertPosition::AfterEnd, "<i>R</i>")?;
        let host = dom.by_id("host").expect("host exists");
        assert_eq!(dom.inner_html(host)?, r#"<i>L</i><span id="mid">M</span><i>R</i>"#);
        Ok(())
    }

    #[test]
    fn replace_outer_html_swaps_the_element_in_place() -> crate::Result<()> {
        let mut dom = dom_from(r#"<div id="wrap"><p id="x">old</p><p id="y">Y</p></div>"#);
        let x = dom.by_id("x").expect("x exists");
        dom.replace_outer_html(x, r#"<p id="x">new</p>"#)?;

        let wrap = dom.by_id("wrap").expect("wrap exists");
        assert_eq!(dom.inner_html(wrap)?, r#"<p id="x">new</p><p id="y">Y</p>"#);
        let replacement = dom.by_id("x").expect("x still indexed");
        assert_eq!(dom.text_content(replacement), "new");
        Ok(())
    }

    #[test]
    fn adoption_strips_scripts_and_handler_attributes() -> crate::Result<()> {
        let mut dom = dom_from(r#"<div id="box"></div>"#);
        let boxed = dom.by_id("box").expect("box exists");
        dom.set_inner_html(
            boxed,
            r#"<script>boom()</script><a id="link" href="javascript:boom()" onclick="boom()">safe</a>"#,
        )?;
        assert_eq!(dom.inner_html(boxed)?, r#"<a id="link">safe</a>"#);
        Ok(())
    }

    #[test]
    fn closest_finds_self_and_ancestor_by_attr_prefix() -> crate::Result<()> {
        let dom = dom_from(
            r#"<article id="player-card-4"><footer><button id="btn">x</button></footer></article>"#,
        );
        let button = dom.by_id("btn").expect("btn exists");
        let card = dom.closest(button, r#"[id^="player-card-"]"#)?;
        assert_eq!(card, dom.by_id("player-card-4"));
        let from_card = dom.closest(card.expect("card"), r#"[id^="player-card-"]"#)?;
        assert_eq!(from_card, card);
        Ok(())
    }

    #[test]
    fn removal_detaches_and_unindexes() -> crate::Result<()> {
        let mut dom = dom_from(r#"<div id="keep"></div><div id="drop"></div>"#);
        let drop = dom.by_id("drop").expect("drop exists");
        dom.remove_node(drop)?;
        assert!(dom.by_id("drop").is_none());
        assert!(dom.by_id("keep").is_some());
        Ok(())
    }

    #[test]
    fn class_helpers_toggle_tokens() -> crate::Result<()> {
        let mut dom = dom_from(r#"<div id="a" class="pill active"></div>"#);
        let a = dom.by_id("a").expect("a exists");
        assert!(dom.has_class(a, "active"));
        dom.remove_class(a, "active")?;
        dom.add_class(a, "hidden")?;
        dom.add_class(a, "hidden")?;
        assert_eq!(dom.attr(a, "class").as_deref(), Some("pill hidden"));
        dom.toggle_class(a, "hidden", false)?;
        assert!(!dom.has_class(a, "hidden"));
        Ok(())
    }

    #[test]
    fn select_value_prefers_selected_option() -> crate::Result<()> {
        let mut dom = dom_from(
            r#"<select id="pos" name="position1">
                 <option value="">none</option>
                 <option value="GK" selected>GK</option>
               </select>"#,
        );
        let select = dom.by_id("pos").expect("select exists");
        assert_eq!(dom.value(select)?, "GK");
        dom.set_value(select, "")?;
        assert_eq!(dom.value(select)?, "");
        Ok(())
    }
}
