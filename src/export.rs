//! Statement-export request construction.
//!
//! The export POST reproduces the portal's transaction-search form: a large
//! fixed set of framework-generated field names, most of them client-state
//! sentinels echoed back as `VALID`. The names are opaque pass-through
//! constants, not business logic; the portal rejects submissions where any
//! of them is missing. Only a handful of value slots carry caller data.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::page::{PageState, ANTI_FORGERY_FIELD};

/// Account flavor. Credit-card accounts live under a different path segment
/// and render a reduced form without the savings-goal group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    #[default]
    Standard,
    CreditCard,
}

impl AccountKind {
    fn path_segment(self) -> Option<&'static str> {
        match self {
            AccountKind::Standard => None,
            AccountKind::CreditCard => Some("credit-card"),
        }
    }
}

/// Which transaction directions the export includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeFilter {
    DepositsAndWithdrawals,
    WithdrawalsOnly,
    DepositsOnly,
}

impl IncludeFilter {
    pub fn form_value(self) -> &'static str {
        match self {
            IncludeFilter::DepositsAndWithdrawals => "DepositsAndWithdrawals",
            IncludeFilter::WithdrawalsOnly => "WithdrawalsOnly",
            IncludeFilter::DepositsOnly => "DepositsOnly",
        }
    }
}

/// Export format codes as the portal's format list names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "CSV-Extended")]
    CsvExtended,
    #[serde(rename = "CSV-Basic")]
    CsvBasic,
    #[serde(rename = "OFX")]
    Ofx,
    #[serde(rename = "OFC")]
    Ofc,
    #[serde(rename = "QIF")]
    Qif,
    #[serde(rename = "PDF-Extended")]
    PdfExtended,
    #[serde(rename = "PDF-Basic")]
    PdfBasic,
}

impl ExportFormat {
    pub fn form_value(self) -> &'static str {
        match self {
            ExportFormat::CsvExtended => "CSV-Extended",
            ExportFormat::CsvBasic => "CSV-Basic",
            ExportFormat::Ofx => "OFX",
            ExportFormat::Ofc => "OFC",
            ExportFormat::Qif => "QIF",
            ExportFormat::PdfExtended => "PDF-Extended",
            ExportFormat::PdfBasic => "PDF-Basic",
        }
    }

    /// File extension conventionally used for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::CsvExtended | ExportFormat::CsvBasic => "csv",
            ExportFormat::Ofx => "ofx",
            ExportFormat::Ofc => "ofc",
            ExportFormat::Qif => "qif",
            ExportFormat::PdfExtended | ExportFormat::PdfBasic => "pdf",
        }
    }
}

/// Everything the caller chooses about one statement export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportCriteria {
    pub account_id: String,
    #[serde(default)]
    pub account_kind: AccountKind,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Lower amount bound; `None` means no bound (the form takes an empty
    /// string).
    #[serde(default)]
    pub amount_low: Option<Decimal>,
    /// Upper amount bound; `None` means no bound.
    #[serde(default)]
    pub amount_high: Option<Decimal>,
    pub include: IncludeFilter,
    pub format: ExportFormat,
}

impl ExportCriteria {
    /// Path of the account view page. The export POST goes to the same path.
    pub fn account_path(&self) -> String {
        match self.account_kind.path_segment() {
            Some(segment) => format!("/accounts/view/{segment}/{}", self.account_id),
            None => format!("/accounts/view/{}", self.account_id),
        }
    }

    /// Range checks the server does not perform but a submission would
    /// silently mis-filter on.
    pub fn validate(&self) -> Result<()> {
        if self.date_from > self.date_to {
            return Err(Error::InvalidCriteria {
                reason: format!(
                    "date_from {} is after date_to {}",
                    self.date_from, self.date_to
                ),
            });
        }
        if let (Some(low), Some(high)) = (self.amount_low, self.amount_high) {
            if low > high {
                return Err(Error::InvalidCriteria {
                    reason: format!("amount_low {low} exceeds amount_high {high}"),
                });
            }
        }
        Ok(())
    }
}

/// Render a date the way the form expects: day/month/year, no leading zeros.
fn form_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// Unset bounds become the empty string, which the server reads as
/// "no bound".
fn form_amount(amount: Option<Decimal>) -> String {
    amount.map(|a| a.to_string()).unwrap_or_default()
}

pub(crate) fn field(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// Assemble the complete ordered field set for the export POST.
///
/// Pure and deterministic: identical inputs yield an identical sequence.
/// Tokens are merged verbatim from `page`; the anti-forgery token is
/// mandatory here even though other pages omit it. The savings-goal title
/// group at the tail is present exactly when the account is not a credit
/// card; getting that conditional wrong malforms the submission.
pub fn build_export_fields(
    criteria: &ExportCriteria,
    page: &PageState,
) -> Result<Vec<(String, String)>> {
    criteria.validate()?;

    let anti_forgery = page.anti_forgery_token.as_deref().ok_or(Error::MalformedPage {
        field: ANTI_FORGERY_FIELD,
    })?;

    let account_path = criteria.account_path();

    let mut fields = vec![
        field("__RequestVerificationToken", anti_forgery),
        field("__EVENTTARGET", "ctl00$c$TransactionSearchControl$ActionButton"),
        field("__EVENTARGUMENT", ""),
        field("__LASTFOCUS", ""),
        field("__VSTATE", &page.state_token),
        field("__VIEWSTATE", ""),
        field("__EVENTVALIDATION", &page.validation_token),
        field("ctl00$c$TransactionSearchControl$AccountList", &account_path),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$initialDate$TextBox",
            &form_date(criteria.date_from),
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FromDateRegex_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FromDateTextBoxExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FromDateRegex_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$InitialDateNotFuture_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$InitialDateNotFutureTextBoxExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$InitialDateNotFuture_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FromHistoryLimit_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FromHistoryLimitExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FromHistoryLimit_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$finalDate$TextBox",
            &form_date(criteria.date_to),
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$ToDateRegex_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FinalDateTextBoxExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$ToDateRegex_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$DateRangeValidity_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$DateRangeValidityExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$DateRangeValidity_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FutureDate_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FinalDateNotFutureExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$FutureDate_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$ToDateHistoryLimit_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$ToDateHistoryLimitExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$ToDateHistoryLimit_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$DateRangeLimitValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$DateRangeLimitValidatorExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DualDateSelector$DateRangeLimitValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$TransactionAmountLowerBoundField",
            &form_amount(criteria.amount_low),
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$LowerBoundRegex_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$LowerBoundTextFieldExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$LowerBoundRegex_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$TransactionAmountUpperBoundField",
            &form_amount(criteria.amount_high),
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$UpperBoundRegex_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$UpperBoundTextFieldExtender_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$AmountRange$UpperBoundRegex_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$TransactionSearchControl$DWGroup",
            criteria.include.form_value(),
        ),
        field(
            "ctl00$c$TransactionSearchControl$ExportFormats$List",
            criteria.format.form_value(),
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$Starting$AmountControl$TransferFundsAmountTextBox",
            "0.00",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$Starting$AmountControl$AmountMandatoryValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$Starting$AmountControl$AmountFormatValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$Starting$AmountControl$AmountFormatValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$Starting$AmountControl$AmountValueValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$Starting$AmountControl$AmountValueValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$TargetBalance$AmountControl$TransferFundsAmountTextBox",
            "0.00",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$TargetBalance$AmountControl$AmountMandatoryValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$TargetBalance$AmountControl$AmountFormatValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$TargetBalance$AmountControl$AmountFormatValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$TargetBalance$AmountControl$AmountValueValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$TargetBalance$AmountControl$AmountValueValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$StartingAmountValidator_ErrorToggle_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$StartingAmountValidator_ErrorHighlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$GoalAmountValidator_ErrorToggle_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$GoalAmountValidator_ErrorHighLight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$SelectedDateControl$TextBox",
            "",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$DateOverrideNull",
            "",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$DateRequiredFieldValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$DateRangeValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$DateRangeValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$DateIsDateValidator_Highlight_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$DateControl$DateIsDateValidator_ShowError_ClientState",
            "VALID",
        ),
        field(
            "ctl00$c$AccountGoal$SaveGoalControl$SelectedAccountGoalTypeField",
            "Savings",
        ),
    ];

    if criteria.account_kind != AccountKind::CreditCard {
        fields.extend([
            field(
                "ctl00$c$AccountGoal$SaveGoalControl$AccountTitleTextField",
                "",
            ),
            field(
                "ctl00$c$AccountGoal$SaveGoalControl$customisedNameValidation_errorToggle_ClientState",
                "VALID",
            ),
            field(
                "ctl00$c$AccountGoal$SaveGoalControl$ToggleCssClassExtender1_ClientState",
                "VALID",
            ),
        ]);
    }

    Ok(fields)
}
