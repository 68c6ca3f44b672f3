use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// One serialized form field. File controls carry the selected file name;
/// in a headless run the bytes are whatever the host supplied (often none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File { filename: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Option<Vec<(String, FormValue)>>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn form(mut self, fields: Vec<(String, FormValue)>) -> Self {
        self.form = Some(fields);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn form_text(&self, field: &str) -> Option<&str> {
        self.form.as_ref()?.iter().find_map(|(name, value)| {
            if name == field {
                match value {
                    FormValue::Text(text) => Some(text.as_str()),
                    FormValue::File { .. } => None,
                }
            } else {
                None
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Response {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json".into(),
            body: body.into(),
        }
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8".into(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8".into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The background-request seam. The interaction controller only ever talks
/// to this trait; tests script a [`MockTransport`], hosts with a live
/// backend plug in an [`HttpClient`].
pub trait Transport {
    fn send(&mut self, request: Request) -> Result<Response>;
}

/// Scripted transport: per-(method, url) response queues plus a log of every
/// request issued, so tests can assert both directions of the exchange.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: HashMap<(Method, String), VecDeque<Response>>,
    calls: Vec<Request>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&mut self, method: Method, url: impl Into<String>, response: Response) {
        self.routes
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    pub fn expect_get(&mut self, url: impl Into<String>, response: Response) {
        self.expect(Method::Get, url, response);
    }

    pub fn expect_post(&mut self, url: impl Into<String>, response: Response) {
        self.expect(Method::Post, url, response);
    }

    pub fn take_calls(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.calls)
    }

    pub fn calls(&self) -> &[Request] {
        &self.calls
    }
}

impl Transport for MockTransport {
    fn send(&mut self, request: Request) -> Result<Response> {
        let key = (request.method, request.url.clone());
        let response = self
            .routes
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                Error::Transport(format!(
                    "no scripted response for {} {}",
                    request.method, request.url
                ))
            });
        self.calls.push(request);
        response
    }
}

/// Blocking HTTP transport. Form payloads go out as multipart/form-data,
/// matching what the page submits from its modal forms.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    base_url: String,
    cookie_header: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|err| Error::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            cookie_header: None,
        })
    }

    /// Sends the given raw cookie string on every request, the same string a
    /// [`crate::CookieJar`] reads the anti-forgery token from.
    pub fn with_cookies(mut self, raw: impl Into<String>) -> Self {
        self.cookie_header = Some(raw.into());
        self
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

impl Transport for HttpClient {
    fn send(&mut self, request: Request) -> Result<Response> {
        let url = self.absolute_url(&request.url);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(raw) = &self.cookie_header {
            builder = builder.header(reqwest::header::COOKIE, raw.as_str());
        }

        if let Some(fields) = request.form {
            let mut form = reqwest::blocking::multipart::Form::new();
            for (name, value) in fields {
                form = match value {
                    FormValue::Text(text) => form.text(name, text),
                    FormValue::File { filename, bytes } => form.part(
                        name,
                        reqwest::blocking::multipart::Part::bytes(bytes).file_name(filename),
                    ),
                };
            }
            builder = builder.multipart(form);
        }

        let response = builder
            .send()
            .map_err(|err| Error::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .map_err(|err| Error::Transport(err.to_string()))?;
        Ok(Response {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_queued_responses_in_order_and_logs_calls() -> Result<()> {
        let mut http = MockTransport::new();
        http.expect_get("/a", Response::json(200, "1"));
        http.expect_get("/a", Response::json(200, "2"));

        let first = http.send(Request::get("/a"))?;
        let second = http.send(Request::get("/a"))?;
        assert_eq!(first.body, "1");
        assert_eq!(second.body, "2");

        let calls = http.take_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, Method::Get);
        Ok(())
    }

    #[test]
    fn mock_rejects_unscripted_requests_but_still_logs_them() {
        let mut http = MockTransport::new();
        let err = http.send(Request::post("/missing")).expect_err("should fail");
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(http.calls().len(), 1);
    }

    #[test]
    fn request_builder_collects_headers_and_fields() {
        let request = Request::post("/player/new/")
            .header("X-CSRFToken", "tok")
            .form(vec![("name".into(), FormValue::Text("Kaka".into()))]);
        assert_eq!(request.header_value("x-csrftoken"), Some("tok"));
        assert_eq!(request.form_text("name"), Some("Kaka"));
        assert_eq!(request.form_text("club"), None);
    }

    #[test]
    fn absolute_urls_pass_through_and_relative_join_the_base() -> Result<()> {
        let client = HttpClient::new("http://127.0.0.1:8000/")?;
        assert_eq!(
            client.absolute_url("/squad/player/form/"),
            "http://127.0.0.1:8000/squad/player/form/"
        );
        assert_eq!(client.absolute_url("https://x.test/y"), "https://x.test/y");
        Ok(())
    }
}
