//! Hidden synchronization-token extraction.
//!
//! Every page in the portal's form flow embeds opaque ASP.NET state blobs
//! that the next POST must echo back to prove continuity of the same
//! server-side interaction. Tokens are fresh per page and single-use; a
//! `PageState` is never carried across pages.

use scraper::{Html, Selector};

use crate::error::{Error, Result};

pub const STATE_TOKEN_FIELD: &str = "__VSTATE";
pub const VALIDATION_TOKEN_FIELD: &str = "__EVENTVALIDATION";
pub const ANTI_FORGERY_FIELD: &str = "__RequestVerificationToken";

/// Synchronization tokens scraped from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub state_token: String,
    pub validation_token: String,
    /// Only the account/export page carries this; elsewhere it is absent.
    pub anti_forgery_token: Option<String>,
}

impl PageState {
    /// Extract the two mandatory tokens; the anti-forgery token is captured
    /// when present.
    pub fn extract(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);

        let state_token = hidden_value(&document, STATE_TOKEN_FIELD).ok_or(Error::MalformedPage {
            field: STATE_TOKEN_FIELD,
        })?;
        let validation_token =
            hidden_value(&document, VALIDATION_TOKEN_FIELD).ok_or(Error::MalformedPage {
                field: VALIDATION_TOKEN_FIELD,
            })?;
        let anti_forgery_token = hidden_value(&document, ANTI_FORGERY_FIELD);

        Ok(Self {
            state_token,
            validation_token,
            anti_forgery_token,
        })
    }

    /// Like [`PageState::extract`], but the anti-forgery token is mandatory.
    /// The export flow requires it; the login and challenge pages do not
    /// carry one.
    pub fn extract_with_anti_forgery(html: &str) -> Result<Self> {
        let state = Self::extract(html)?;
        if state.anti_forgery_token.is_none() {
            return Err(Error::MalformedPage {
                field: ANTI_FORGERY_FIELD,
            });
        }
        Ok(state)
    }
}

/// Value attribute of the element carrying the given id, wherever it sits
/// in the document.
fn hidden_value(document: &Html, id: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"[id="{id}"]"#)).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr("value")
        .map(str::to_string)
}
