use crate::config::PageConfig;
use crate::cookies::CookieJar;
use crate::dom::{Dom, InsertPosition, NodeId};
use crate::http::{FormValue, Request, Transport};
use crate::page::Page;
use crate::protocol::{self, Body, CreatedCard, DeleteAck, EditedCard};
use crate::{Error, Result};

/// Result of an open-modal attempt. The non-`Opened` variants have already
/// surfaced an alert; no request is in flight and no session exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    MissingUrl,
    FetchFailed(String),
}

/// How a successful mutation was reconciled into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// New card prepended into its role group.
    Inserted,
    /// Existing card replaced in place, identity preserved.
    Replaced,
    /// Card left its old group and was prepended into another.
    Moved,
    /// The response did not say how to patch, so a full reload was requested.
    Reloaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed(PatchOutcome),
    /// Submission failed; the alert is recorded and the modal stays open.
    /// The session is spent, so retrying means reopening the modal.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// Confirmation declined; no request was issued.
    Declined,
    MissingUrl,
    Rejected(String),
    /// 2xx response without an `ok` flag or an id; the card is kept.
    Unacknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionKind {
    Create,
    Edit,
}

/// One open create-or-edit dialog. Created by `open_*`, consumed by exactly
/// one submission or discarded when the modal is hidden.
#[derive(Debug)]
struct ModalSession {
    kind: SessionKind,
    submit_url: String,
}

/// Owns the modal lifecycle and the three mutating flows. All document
/// changes go through the [`Page`] handed in per call; all network traffic
/// goes through the [`Transport`].
#[derive(Debug)]
pub struct InteractionController {
    config: PageConfig,
    cookies: CookieJar,
    session: Option<ModalSession>,
}

impl InteractionController {
    pub fn new(config: PageConfig, cookies: CookieJar) -> Self {
        Self {
            config,
            cookies,
            session: None,
        }
    }

    pub fn session_open(&self) -> bool {
        self.session.is_some()
    }

    /// Opens the create dialog from a trigger carrying both the
    /// form-fragment URL and the submission URL.
    pub fn open_create<T: Transport>(
        &mut self,
        page: &mut Page,
        http: &mut T,
        trigger: &str,
    ) -> Result<OpenOutcome> {
        if self.session.is_some() {
            return Err(Error::ModalSessionActive);
        }
        let node = page.select_one(trigger)?;
        let Some(form_url) = page.dom.attr(node, &self.config.form_url_attr) else {
            page.alert("Form URL missing on the trigger control.");
            return Ok(OpenOutcome::MissingUrl);
        };
        let Some(submit_url) = page.dom.attr(node, &self.config.url_attr) else {
            page.alert("Create URL missing on the trigger control.");
            return Ok(OpenOutcome::MissingUrl);
        };
        self.open_with_form(page, http, &form_url, submit_url, SessionKind::Create)
    }

    /// Opens the edit dialog. One URL serves both the fragment GET and the
    /// later POST.
    pub fn open_edit<T: Transport>(
        &mut self,
        page: &mut Page,
        http: &mut T,
        trigger: &str,
    ) -> Result<OpenOutcome> {
        if self.session.is_some() {
            return Err(Error::ModalSessionActive);
        }
        let node = page.select_one(trigger)?;
        let Some(url) = page.dom.attr(node, &self.config.url_attr) else {
            page.alert("Edit URL missing on the trigger control.");
            return Ok(OpenOutcome::MissingUrl);
        };
        self.open_with_form(page, http, &url, url.clone(), SessionKind::Edit)
    }

    fn open_with_form<T: Transport>(
        &mut self,
        page: &mut Page,
        http: &mut T,
        form_url: &str,
        submit_url: String,
        kind: SessionKind,
    ) -> Result<OpenOutcome> {
        log::debug!("fetching form fragment: GET {form_url}");
        let body = match http
            .send(self.background_get(form_url))
            .and_then(|response| protocol::decode(&response))
        {
            Ok(body) => body,
            Err(err) => {
                let message = err.to_string();
                page.alert(message.clone());
                return Ok(OpenOutcome::FetchFailed(message));
            }
        };
        let markup = match protocol::fragment_html(&body) {
            Some(markup) if !markup.is_empty() => markup,
            _ => {
                let message = "Form fragment missing from the response.".to_string();
                page.alert(message.clone());
                return Ok(OpenOutcome::FetchFailed(message));
            }
        };

        let modal_body = page.select_one(&self.config.modal_body_selector)?;
        page.dom.set_inner_html(modal_body, &markup)?;
        let modal = page.select_one(&self.config.modal_selector)?;
        page.dom.remove_class(modal, &self.config.hidden_class)?;

        self.session = Some(ModalSession { kind, submit_url });
        Ok(OpenOutcome::Opened)
    }

    /// Submits the form currently rendered in the modal body. Consumes the
    /// session whether or not the backend accepts the submission.
    pub fn submit_modal<T: Transport>(
        &mut self,
        page: &mut Page,
        http: &mut T,
    ) -> Result<SubmitOutcome> {
        let session = self.session.take().ok_or(Error::NoModalSession)?;
        let form_selector = format!("{} form", self.config.modal_body_selector);
        let form = page.select_one(&form_selector)?;
        let fields = collect_form_fields(&page.dom, form);

        log::debug!("submitting modal form: POST {}", session.submit_url);
        let request = self.mutating_post(&session.submit_url).form(fields);
        let body = match http
            .send(request)
            .and_then(|response| protocol::decode(&response))
        {
            Ok(body) => body,
            Err(err) => {
                let message = err.to_string();
                page.alert(message.clone());
                return Ok(SubmitOutcome::Rejected(message));
            }
        };

        self.hide_modal(page)?;
        let patch = match session.kind {
            SessionKind::Create => self.insert_created(page, &body)?,
            SessionKind::Edit => self.reconcile_edited(page, &body)?,
        };
        Ok(SubmitOutcome::Completed(patch))
    }

    /// Confirmation-gated delete of the card enclosing the trigger control.
    pub fn delete<T: Transport>(
        &mut self,
        page: &mut Page,
        http: &mut T,
        trigger: &str,
    ) -> Result<DeleteOutcome> {
        let node = page.select_one(trigger)?;
        let Some(url) = page.dom.attr(node, &self.config.url_attr) else {
            page.alert("Delete URL missing on the trigger control.");
            return Ok(DeleteOutcome::MissingUrl);
        };
        if !page.confirm(&self.config.delete_prompt) {
            return Ok(DeleteOutcome::Declined);
        }

        log::debug!("deleting roster entry: POST {url}");
        let body = match http
            .send(self.mutating_post(&url))
            .and_then(|response| protocol::decode(&response))
        {
            Ok(body) => body,
            Err(err) => {
                let message = err.to_string();
                page.alert(message.clone());
                return Ok(DeleteOutcome::Rejected(message));
            }
        };

        let ack: DeleteAck = protocol::reply_from(&body);
        if !ack.acknowledged() {
            return Ok(DeleteOutcome::Unacknowledged);
        }
        let card_selector = format!("[id^=\"{}\"]", self.config.card_id_prefix);
        if let Some(card) = page.dom.closest(node, &card_selector)? {
            page.dom.remove_node(card)?;
        } else {
            log::warn!("delete acknowledged but no enclosing card was found");
        }
        Ok(DeleteOutcome::Removed)
    }

    /// Clears the modal body and hides the modal container. Discards any
    /// session. Safe to call at any time.
    pub fn hide_modal(&mut self, page: &mut Page) -> Result<()> {
        self.session = None;
        if let Some(modal_body) = page.query_selector(&self.config.modal_body_selector)? {
            page.dom.set_inner_html(modal_body, "")?;
        }
        if let Some(modal) = page.query_selector(&self.config.modal_selector)? {
            page.dom.add_class(modal, &self.config.hidden_class)?;
        }
        Ok(())
    }

    /// Click handling for the modal backdrop: hides the modal when the
    /// clicked element inside it carries the close marker attribute.
    pub fn dismiss(&mut self, page: &mut Page, target: &str) -> Result<bool> {
        let node = page.select_one(target)?;
        let Some(modal) = page.query_selector(&self.config.modal_selector)? else {
            return Ok(false);
        };
        let inside_modal = node == modal || page.dom.is_descendant_of(node, modal);
        if inside_modal && page.dom.has_attr(node, &self.config.close_attr) {
            self.hide_modal(page)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn insert_created(&self, page: &mut Page, body: &Body) -> Result<PatchOutcome> {
        let reply: CreatedCard = protocol::reply_from(body);
        log::debug!("create acknowledged for entity {:?}", reply.id);
        let markup = reply.html.filter(|html| !html.is_empty());
        let (Some(role), Some(markup)) = (reply.role_tag, markup) else {
            log::warn!("create reply did not carry role_tag and html");
            page.request_reload();
            return Ok(PatchOutcome::Reloaded);
        };
        if self.prepend_into_group(page, &role, &markup)? {
            Ok(PatchOutcome::Inserted)
        } else {
            Ok(PatchOutcome::Reloaded)
        }
    }

    fn reconcile_edited(&self, page: &mut Page, body: &Body) -> Result<PatchOutcome> {
        let reply: EditedCard = protocol::reply_from(body);
        let existing = reply
            .id
            .and_then(|id| page.dom.by_id(&self.config.card_element_id(id)));
        let markup = reply.html.filter(|html| !html.is_empty());

        if reply.moved {
            if let Some(old) = existing {
                page.dom.remove_node(old)?;
            }
            let (Some(role), Some(markup)) = (reply.role_tag, markup) else {
                log::warn!("move reply did not carry role_tag and html");
                page.request_reload();
                return Ok(PatchOutcome::Reloaded);
            };
            if self.prepend_into_group(page, &role, &markup)? {
                return Ok(PatchOutcome::Moved);
            }
            return Ok(PatchOutcome::Reloaded);
        }

        match (existing, markup) {
            (Some(old), Some(markup)) => {
                page.dom.replace_outer_html(old, &markup)?;
                if let Some(id) = reply.id {
                    if let Some(card) = page.dom.by_id(&self.config.card_element_id(id)) {
                        page.scroll_into_view(card);
                    }
                }
                Ok(PatchOutcome::Replaced)
            }
            _ => {
                log::warn!("edit reply could not be patched in place");
                page.request_reload();
                Ok(PatchOutcome::Reloaded)
            }
        }
    }

    /// Prepends the card markup into the role group's card list. False means
    /// the group was missing and a reload was requested instead.
    fn prepend_into_group(&self, page: &mut Page, role: &str, markup: &str) -> Result<bool> {
        let list = page
            .dom
            .query_selector(&self.config.card_list_in_group(role))?;
        let Some(list) = list else {
            log::warn!("no role group on the page for {role}");
            page.request_reload();
            return Ok(false);
        };
        page.dom
            .insert_adjacent_html(list, InsertPosition::AfterBegin, markup)?;
        if let Some(first) = page.dom.first_element_child(list) {
            page.scroll_into_view(first);
        }
        Ok(true)
    }

    fn background_get(&self, url: &str) -> Request {
        Request::get(url)
            .header(
                self.config.background_header.as_str(),
                self.config.background_value.as_str(),
            )
            .header("Accept", "application/json")
    }

    fn mutating_post(&self, url: &str) -> Request {
        Request::post(url)
            .header(
                self.config.csrf_header.as_str(),
                self.cookies.get(&self.config.csrf_cookie).unwrap_or_default(),
            )
            .header(
                self.config.background_header.as_str(),
                self.config.background_value.as_str(),
            )
            .header("Accept", "application/json")
    }
}

/// Serializes the form the way a browser builds `FormData`: named, enabled
/// controls in document order; checkbox/radio only when checked; file inputs
/// as named file parts; button-like inputs skipped.
fn collect_form_fields(dom: &Dom, form: NodeId) -> Vec<(String, FormValue)> {
    let mut controls = Vec::new();
    collect_controls(dom, form, &mut controls);

    let mut fields = Vec::new();
    for control in controls {
        let Some(name) = dom.attr(control, "name").filter(|name| !name.is_empty()) else {
            continue;
        };
        if dom.has_attr(control, "disabled") {
            continue;
        }
        let tag = dom
            .tag_name(control)
            .unwrap_or_default()
            .to_ascii_lowercase();
        let value = match tag.as_str() {
            "input" => {
                let kind = dom
                    .attr(control, "type")
                    .unwrap_or_else(|| "text".into())
                    .to_ascii_lowercase();
                match kind.as_str() {
                    "button" | "submit" | "reset" | "image" => continue,
                    "checkbox" | "radio" => {
                        if !dom.is_checked(control) {
                            continue;
                        }
                        FormValue::Text(dom.attr(control, "value").unwrap_or_else(|| "on".into()))
                    }
                    "file" => FormValue::File {
                        filename: dom.attr(control, "value").unwrap_or_default(),
                        bytes: Vec::new(),
                    },
                    _ => FormValue::Text(dom.attr(control, "value").unwrap_or_default()),
                }
            }
            "select" | "textarea" => match dom.value(control) {
                Ok(value) => FormValue::Text(value),
                Err(_) => continue,
            },
            _ => continue,
        };
        fields.push((name, value));
    }
    fields
}

fn collect_controls(dom: &Dom, node: NodeId, out: &mut Vec<NodeId>) {
    for child in dom.children(node) {
        if dom
            .tag_name(*child)
            .is_some_and(|tag| matches!(tag, "input" | "select" | "textarea"))
        {
            out.push(*child);
        }
        collect_controls(dom, *child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_fragment;

    #[test]
    fn form_serialization_follows_browser_formdata_rules() -> Result<()> {
        let dom = parse_fragment(
            r#"<form id="f">
                 <input name="name" value="Kaka">
                 <input name="nick">
                 <input type="checkbox" name="fit" checked>
                 <input type="checkbox" name="injured">
                 <input type="radio" name="foot" value="L">
                 <input type="radio" name="foot" value="R" checked>
                 <input type="file" name="photo" value="kaka.png">
                 <input type="submit" name="go" value="Save">
                 <input name="secret" value="x" disabled>
                 <input value="anonymous">
                 <select name="position1">
                   <option value="CM">CM</option>
                   <option value="CAM" selected>CAM</option>
                 </select>
                 <textarea name="bio">Playmaker</textarea>
               </form>"#,
        )?;
        let form = dom.by_id("f").expect("form exists");
        let fields = collect_form_fields(&dom, form);

        assert_eq!(
            fields,
            vec![
                ("name".into(), FormValue::Text("Kaka".into())),
                ("nick".into(), FormValue::Text("".into())),
                ("fit".into(), FormValue::Text("on".into())),
                ("foot".into(), FormValue::Text("R".into())),
                (
                    "photo".into(),
                    FormValue::File {
                        filename: "kaka.png".into(),
                        bytes: Vec::new()
                    }
                ),
                ("position1".into(), FormValue::Text("CAM".into())),
                ("bio".into(), FormValue::Text("Playmaker".into())),
            ]
        );
        Ok(())
    }
}
