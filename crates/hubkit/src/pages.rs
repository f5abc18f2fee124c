//! Lazy pagination over GitHub listing endpoints.
//!
//! A [`Pages`] iterator is forward-only and fetches one page per `next()`
//! call, following the `Link: <...>; rel="next"` header. Each listing method
//! returns a fresh iterator, so a listing is restarted simply by calling the
//! method again.

use crate::client::GitHubClient;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Iterator over pages of a listing; each item is one page.
pub struct Pages<'a, T> {
    client: &'a GitHubClient,
    next: Option<String>,
    field: Option<&'static str>,
    _item: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Pages<'a, T> {
    pub(crate) fn new(client: &'a GitHubClient, first: String, field: Option<&'static str>) -> Self {
        Self {
            client,
            next: Some(first),
            field,
            _item: PhantomData,
        }
    }

    fn fetch(&mut self, url: &str) -> Result<Vec<T>> {
        let mut response = self.client.get_url(url)?;
        let next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);

        let body: Value = response.body_mut().read_json()?;
        let items = extract_items(body, self.field)?;

        self.next = next;
        Ok(items)
    }
}

impl<T: DeserializeOwned> Iterator for Pages<'_, T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let url = self.next.take()?;
        // A failed page leaves `next` empty, ending the iteration.
        Some(self.fetch(&url))
    }
}

/// Pull the item array out of a page body and decode it.
fn extract_items<T: DeserializeOwned>(body: Value, field: Option<&str>) -> Result<Vec<T>> {
    let items = match field {
        Some(name) => match body {
            Value::Object(mut map) => map.remove(name).ok_or_else(|| {
                Error::InvalidResponse(format!("missing `{name}` array in listing"))
            })?,
            _ => {
                return Err(Error::InvalidResponse(format!(
                    "expected an object with `{name}`"
                )));
            }
        },
        None => body,
    };

    if !items.is_array() {
        return Err(Error::InvalidResponse("expected an array of items".to_string()));
    }
    Ok(serde_json::from_value(items)?)
}

/// Parse the `rel="next"` target out of a `Link` header.
pub(crate) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.trim().split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
        if !is_next {
            return None;
        }
        target
            .trim()
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(ToString::to_string)
    })
}
