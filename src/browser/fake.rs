//! In-memory browser session for tests.
//!
//! Pages are scripted as flat lists of (selector, element) pairs; a query
//! returns clones of every element registered under that exact selector.
//! Selectors listed in `vanish_after` match for a fixed number of checks and
//! then disappear, which is enough to script spinners that clear (or never
//! clear) without a real DOM.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::BrowserSession;
use crate::error::BrowserError;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub id: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<(String, FakeElement)>,
}

impl FakeElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, element: FakeElement) -> Self {
        self.children.push((selector.to_string(), element));
        self
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    pages: Mutex<HashMap<String, Vec<(String, FakeElement)>>>,
    current: Mutex<Option<String>>,
    vanish_after: Mutex<HashMap<String, u32>>,
    appear_after: Mutex<HashMap<String, u32>>,
    pub visited: Mutex<Vec<String>>,
    pub clicked: Mutex<Vec<String>>,
    pub typed: Mutex<Vec<(String, String)>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page's elements under a URL.
    pub fn page(self, url: &str, elements: Vec<(&str, FakeElement)>) -> Self {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            elements
                .into_iter()
                .map(|(s, e)| (s.to_string(), e))
                .collect(),
        );
        self
    }

    /// Make a selector match for `checks` queries, then stop matching.
    ///
    /// `u32::MAX` approximates "never clears".
    pub fn vanish_after(self, selector: &str, checks: u32) -> Self {
        self.vanish_after
            .lock()
            .unwrap()
            .insert(selector.to_string(), checks);
        self
    }

    /// Make a selector miss for `checks` queries, then start matching.
    pub fn appear_after(self, selector: &str, checks: u32) -> Self {
        self.appear_after
            .lock()
            .unwrap()
            .insert(selector.to_string(), checks);
        self
    }

    fn current_elements(&self, selector: &str) -> Vec<FakeElement> {
        let current = self.current.lock().unwrap().clone();
        let pages = self.pages.lock().unwrap();
        current
            .and_then(|url| pages.get(&url))
            .map(|elements| {
                elements
                    .iter()
                    .filter(|(s, _)| s == selector)
                    .map(|(_, e)| e.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        if !self.pages.lock().unwrap().contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "no scripted page".to_string(),
            });
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<FakeElement>, BrowserError> {
        let mut appearing = self.appear_after.lock().unwrap();
        if let Some(remaining) = appearing.get_mut(selector) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(Vec::new());
            }
            return Ok(vec![FakeElement::new(selector)]);
        }
        drop(appearing);

        let mut vanishing = self.vanish_after.lock().unwrap();
        if let Some(remaining) = vanishing.get_mut(selector) {
            if *remaining == 0 {
                return Ok(Vec::new());
            }
            if *remaining != u32::MAX {
                *remaining -= 1;
            }
            return Ok(vec![FakeElement::new(selector)]);
        }
        drop(vanishing);
        Ok(self.current_elements(selector))
    }

    async fn query_within(
        &self,
        element: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, BrowserError> {
        Ok(element
            .children
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn text(&self, element: &FakeElement) -> Result<String, BrowserError> {
        Ok(element.text.clone())
    }

    async fn attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(element.attrs.get(name).cloned())
    }

    async fn click(&self, element: &FakeElement) -> Result<(), BrowserError> {
        self.clicked.lock().unwrap().push(element.id.clone());
        Ok(())
    }

    async fn clear_and_type(
        &self,
        element: &FakeElement,
        text: &str,
    ) -> Result<(), BrowserError> {
        self.typed
            .lock()
            .unwrap()
            .push((element.id.clone(), text.to_string()));
        Ok(())
    }
}
