//! Cookie-backed ephemeral state for the flash message.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::Response;
use cookie::{Cookie, SameSite};
use todo_reminder_app::{EphemeralEntry, EphemeralState};
use tracing::warn;

/// Request cookies plus the writes queued while handling the request.
#[derive(Debug, Default)]
pub struct CookieState {
    incoming: BTreeMap<String, String>,
    pending: Vec<EphemeralEntry>,
}

impl CookieState {
    /// Collect every cookie sent with the request. Malformed pairs are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let incoming = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| Cookie::split_parse_encoded(raw.to_owned()))
            .filter_map(Result::ok)
            .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
            .collect();
        Self {
            incoming,
            pending: Vec::new(),
        }
    }

    /// Attach one `Set-Cookie` header per queued write.
    pub fn apply(self, response: &mut Response) {
        for entry in self.pending {
            let cookie = Cookie::build((entry.name, entry.value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .expires(entry.expires)
                .build();
            match HeaderValue::from_str(&cookie.encoded().to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(err) => warn!(name = cookie.name(), error = %err, "dropping unencodable cookie"),
            }
        }
    }
}

impl EphemeralState for CookieState {
    fn get(&self, name: &str) -> Option<String> {
        let latest = self
            .pending
            .iter()
            .rev()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
            .or_else(|| self.incoming.get(name));
        latest.filter(|value| !value.is_empty()).cloned()
    }

    fn put(&mut self, entry: EphemeralEntry) {
        self.pending.retain(|queued| queued.name != entry.name);
        self.pending.push(entry);
    }
}
