//! Deterministic headless runtime for the interaction layer of a
//! server-rendered roster page.
//!
//! The crate models the page as an in-memory DOM ([`Page`]) and drives the
//! two behaviors the real page script performs: modal-based create/edit/delete
//! of roster cards ([`InteractionController`]) and role-based filtering of
//! card groups ([`RoleFilter`]). Background requests go through the
//! [`Transport`] seam, either scripted ([`MockTransport`]) or over real HTTP
//! ([`HttpClient`]). Browser-native side effects (alert, confirm, reload,
//! scroll-into-view) are recorded on the page so every flow can be asserted
//! in ordinary tests.
//!
//! ```
//! use squad_page::{InteractionController, CookieJar, MockTransport, Page, PageConfig, Response};
//!
//! # fn main() -> squad_page::Result<()> {
//! let mut page = Page::from_html(r#"
//!     <div id="modal" class="hidden"><div id="modal-body"></div></div>
//!     <section class="role-group" data-role="GOALKEEPER"><div class="cards"></div></section>
//!     <button id="add" data-form-url="/player/form/" data-url="/player/new/">Add</button>
//! "#)?;
//! let mut http = MockTransport::new();
//! http.expect_get("/player/form/", Response::json(200, r#"{"html":"<form></form>"}"#));
//!
//! let mut controller = InteractionController::new(PageConfig::default(), CookieJar::empty());
//! controller.open_create(&mut page, &mut http, "#add")?;
//! assert!(!page.has_class("#modal", "hidden")?);
//! # Ok(())
//! # }
//! ```

mod config;
mod controller;
mod cookies;
mod dom;
mod filter;
mod html;
mod http;
mod page;
mod protocol;
mod selector;

pub use config::PageConfig;
pub use controller::{
    DeleteOutcome, InteractionController, OpenOutcome, PatchOutcome, SubmitOutcome,
};
pub use cookies::CookieJar;
pub use dom::NodeId;
pub use filter::{FilterState, RoleFilter};
pub use http::{FormValue, HttpClient, Method, MockTransport, Request, Response, Transport};
pub use page::Page;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("dom error: {0}")]
    Dom(String),
    #[error("transport error: {0}")]
    Transport(String),
    /// A non-2xx response, carrying the best message the body offered.
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("invalid response payload: {0}")]
    Payload(String),
    #[error("a modal session is already open")]
    ModalSessionActive,
    #[error("no modal session is open")]
    NoModalSession,
}
