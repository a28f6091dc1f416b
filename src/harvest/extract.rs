//! Field extraction from a single search result element.
//!
//! Extraction is a pure read of the passed-in element: the mandatory link
//! (URL + title) either resolves or the whole item is skipped, while each
//! optional field independently falls back to the `"N/A"` sentinel.

use crate::browser::BrowserSession;
use crate::config::{ExtractionRules, FieldRule};
use crate::error::ExtractError;
use crate::models::{RawCandidate, OPTIONAL_FIELD_SENTINEL};

/// Extracts one [`RawCandidate`] out of one result element.
pub struct FieldExtractor<'a> {
    rules: &'a ExtractionRules,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(rules: &'a ExtractionRules) -> Self {
        Self { rules }
    }

    /// Extract a candidate, or fail the item when `url`/`title` are absent.
    pub async fn extract<B: BrowserSession>(
        &self,
        session: &B,
        element: &B::Element,
    ) -> Result<RawCandidate, ExtractError> {
        let link = session
            .query_within(element, &self.rules.link)
            .await?
            .into_iter()
            .next()
            .ok_or(ExtractError::MissingField("url"))?;

        let url = session
            .attribute(&link, "href")
            .await?
            .filter(|href| !href.trim().is_empty())
            .ok_or(ExtractError::MissingField("url"))?;

        let title = session.text(&link).await?.trim().to_string();
        if title.is_empty() {
            return Err(ExtractError::MissingField("title"));
        }

        let views_raw = self.field_text(session, element, &self.rules.views).await?;
        let pages_raw = self.field_text(session, element, &self.rules.pages).await?;
        let upload_date_raw = self.upload_date(session, element).await?;

        Ok(RawCandidate {
            title,
            url,
            views_raw,
            pages_raw,
            upload_date_raw,
        })
    }

    /// First matching field text, or the sentinel when nothing matches.
    async fn field_text<B: BrowserSession>(
        &self,
        session: &B,
        element: &B::Element,
        rule: &FieldRule,
    ) -> Result<String, ExtractError> {
        for candidate in session.query_within(element, &rule.selector).await? {
            let text = session.text(&candidate).await?.trim().to_string();
            match &rule.marker {
                Some(marker) if !text.contains(marker.as_str()) => continue,
                _ => return Ok(text),
            }
        }
        Ok(OPTIONAL_FIELD_SENTINEL.to_string())
    }

    /// The date follows the last "le" of the container text
    /// ("Publié par X le 12 mars 2021").
    async fn upload_date<B: BrowserSession>(
        &self,
        session: &B,
        element: &B::Element,
    ) -> Result<String, ExtractError> {
        let raw = self
            .field_text(session, element, &self.rules.upload_date)
            .await?;
        match raw.rsplit_once("le") {
            Some((_, date)) if !date.trim().is_empty() => Ok(date.trim().to_string()),
            _ => Ok(OPTIONAL_FIELD_SENTINEL.to_string()),
        }
    }
}
