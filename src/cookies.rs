use fancy_regex::Regex;

/// A read-only view over a raw `Cookie:` header string.
///
/// The anti-forgery token is extracted with the same pattern the page script
/// applies to `document.cookie`: `(^|;)\s*<name>\s*=\s*([^;]+)`.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    raw: String,
}

impl CookieJar {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let pattern = format!(r"(^|;)\s*{}\s*=\s*([^;]+)", fancy_regex::escape(name));
        let regex = Regex::new(&pattern).ok()?;
        let captures = regex.captures(&self.raw).ok()??;
        captures.get(2).map(|value| value.as_str().to_string())
    }
}
