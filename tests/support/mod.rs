//! Shared page fixtures for the wiremock flow tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use kiwibank_export::export::{AccountKind, ExportCriteria, ExportFormat, IncludeFilter};

pub const ACCOUNT_ID: &str = "123456789ABCDEF123456789ABCDEF12";
pub const QUESTION: &str = "The name of my first pet?";
pub const ANSWER: &str = "pinette";

/// The login form with its synchronization tokens.
pub fn login_page() -> String {
    r#"<html><body>
    <form method="post" action="/login/">
        <input type="hidden" name="__VSTATE" id="__VSTATE" value="login-vstate" />
        <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="login-ev" />
        <input type="text" name="ctl00$c$txtUserName" id="ctl00_c_txtUserName" />
        <input type="password" name="ctl00$c$txtPassword" id="ctl00_c_txtPassword" />
    </form>
    </body></html>"#
        .to_string()
}

/// The challenge page returned by the login POST: one slot div per entry,
/// `true` marks the slot required.
pub fn challenge_page(question: &str, slots: &[bool]) -> String {
    let slot_divs: String = slots
        .iter()
        .map(|&required| {
            if required {
                r#"<div class="letter required"><input type="text" maxlength="1" /></div>"#
            } else {
                r#"<div class="letter"></div>"#
            }
        })
        .collect();

    format!(
        r#"<html><body>
        <div id="question"><div>Security question</div><div>{question}</div></div>
        <div id="answer"><div>Your answer</div>{slot_divs}</div>
        <input type="hidden" name="__VSTATE" id="__VSTATE" value="challenge-vstate" />
        <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="challenge-ev" />
        </body></html>"#
    )
}

/// The account view page carrying all three tokens, including the
/// anti-forgery token the export POST requires.
pub fn account_page() -> String {
    r#"<html><body>
    <input type="hidden" name="__RequestVerificationToken" id="__RequestVerificationToken" value="rvt-blob" />
    <input type="hidden" name="__VSTATE" id="__VSTATE" value="account-vstate" />
    <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="account-ev" />
    <div id="transaction-search">search form</div>
    </body></html>"#
        .to_string()
}

pub fn export_criteria() -> ExportCriteria {
    ExportCriteria {
        account_id: ACCOUNT_ID.to_string(),
        account_kind: AccountKind::Standard,
        date_from: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        date_to: NaiveDate::from_ymd_opt(2024, 12, 24).unwrap(),
        amount_low: None,
        amount_high: None,
        include: IncludeFilter::DepositsAndWithdrawals,
        format: ExportFormat::Ofx,
    }
}
