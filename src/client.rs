//! Portal flow state machine.
//!
//! One [`KiwibankClient`] drives one sequential flow: login, challenge,
//! any number of statement exports, logout. Every operation awaits its
//! round trip before the next is issued; the portal's tokens are single-use
//! and tied to the cookie session the client owns, so there is no retry and
//! no concurrent use of one client. A mid-flow error leaves the stage where
//! the flow died; callers restart from a fresh client for anything other
//! than [`Error::NoStatementData`].

use tracing::{debug, info, warn};

use crate::challenge::{self, ChallengeTable};
use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::export::{build_export_fields, field, ExportCriteria, ExportFormat};
use crate::page::PageState;
use crate::session::Transport;

const LOGIN_PATH: &str = "/login/";
const CHALLENGE_PATH: &str = "/keepsafe/challenge/";
const LOGOUT_PATH: &str = "/logout/";

const LOGIN_EVENT_TARGET: &str = "ctl00$c$ProgressFinalSubmit$FinalStepButton";
const CHALLENGE_EVENT_TARGET: &str = "ctl00$c$ChallengeControl$SubmitAnswer$FinalStepButton";

/// Where a client sits in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Anonymous,
    AwaitingChallenge,
    Authenticated,
    LoggedOut,
}

enum FlowState {
    Anonymous,
    /// Holds the page returned by the login POST. The challenge is resolved
    /// from this exact body because its tokens belong to it.
    AwaitingChallenge { challenge_page: String },
    Authenticated,
    LoggedOut,
}

impl FlowState {
    fn stage(&self) -> Stage {
        match self {
            FlowState::Anonymous => Stage::Anonymous,
            FlowState::AwaitingChallenge { .. } => Stage::AwaitingChallenge,
            FlowState::Authenticated => Stage::Authenticated,
            FlowState::LoggedOut => Stage::LoggedOut,
        }
    }
}

/// An exported statement: raw bytes in the format the caller requested.
/// The bytes are returned uninterpreted.
#[derive(Debug, Clone)]
pub struct StatementDocument {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Client for the portal's login / challenge / export / logout flow.
pub struct KiwibankClient {
    transport: Transport,
    state: FlowState,
}

impl KiwibankClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            state: FlowState::Anonymous,
        })
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    fn expect_stage(&self, expected: Stage) -> Result<()> {
        let actual = self.stage();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::WrongStage { expected, actual })
        }
    }

    /// Fetch the login form and submit credentials. On success the client
    /// holds the returned challenge page and moves to
    /// [`Stage::AwaitingChallenge`].
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.expect_stage(Stage::Anonymous)?;
        info!(username = %credentials.username(), "logging in");

        let login_page = self.transport.get(LOGIN_PATH).await?;
        let tokens = PageState::extract(&login_page.text())?;

        let fields = vec![
            field("__LASTFOCUS", ""),
            field("__EVENTTARGET", LOGIN_EVENT_TARGET),
            field("__EVENTARGUMENT", ""),
            field("__VSTATE", &tokens.state_token),
            field("__VIEWSTATE", ""),
            field("__EVENTVALIDATION", &tokens.validation_token),
            field("ctl00$c$IESError", ""),
            field("ctl00$c$ciam", ""),
            field("ctl00$c$txtUserName", credentials.username()),
            field("ctl00$c$txtPassword", credentials.password()),
        ];

        let response = self.transport.post(LOGIN_PATH, &fields).await?;
        self.state = FlowState::AwaitingChallenge {
            challenge_page: response.text(),
        };
        info!("login submitted, challenge pending");
        Ok(())
    }

    /// Solve the challenge from the page captured at login and submit the
    /// two demanded letters. Moves to [`Stage::Authenticated`].
    pub async fn resolve_challenge(&mut self, table: &ChallengeTable) -> Result<()> {
        let challenge_page = match &self.state {
            FlowState::AwaitingChallenge { challenge_page } => challenge_page.clone(),
            _ => {
                return Err(Error::WrongStage {
                    expected: Stage::AwaitingChallenge,
                    actual: self.stage(),
                })
            }
        };

        let solution = challenge::resolve(&challenge_page, table)?;
        info!(
            question = %solution.question,
            pattern = %solution.pattern_string(),
            "challenge resolved"
        );

        let tokens = PageState::extract(&challenge_page)?;
        let fields = vec![
            field("__EVENTTARGET", CHALLENGE_EVENT_TARGET),
            field("__EVENTARGUMENT", ""),
            field("__VSTATE", &tokens.state_token),
            field("__VIEWSTATE", ""),
            field("__EVENTVALIDATION", &tokens.validation_token),
            field("letter1", &solution.letters.0),
            field("letter2", &solution.letters.1),
        ];

        self.transport.post(CHALLENGE_PATH, &fields).await?;
        self.state = FlowState::Authenticated;
        info!("challenge accepted");
        Ok(())
    }

    /// Export one statement. Repeatable while authenticated; each call
    /// fetches the account page anew because the embedded tokens are
    /// single-use.
    pub async fn export_statement(&mut self, criteria: &ExportCriteria) -> Result<StatementDocument> {
        self.expect_stage(Stage::Authenticated)?;
        criteria.validate()?;

        let path = criteria.account_path();
        info!(account = %criteria.account_id, path = %path, "exporting statement");

        let account_page = self.transport.get(&path).await?;
        let tokens = PageState::extract_with_anti_forgery(&account_page.text())?;

        let fields = build_export_fields(criteria, &tokens)?;
        debug!(field_count = fields.len(), "submitting export form");
        let response = self.transport.post(&path, &fields).await?;

        // Without a file attachment the server re-renders the search page:
        // nothing matched the criteria.
        if response.content_disposition().is_none() {
            return Err(Error::NoStatementData);
        }

        Ok(StatementDocument {
            format: criteria.format,
            bytes: response.into_bytes(),
        })
    }

    /// Terminal, best-effort logout. A failed logout request is logged and
    /// swallowed; the caller is tearing the session down either way, and
    /// dropping the client releases the connection.
    pub async fn logout(&mut self) {
        if let Err(err) = self.transport.get(LOGOUT_PATH).await {
            warn!(error = %err, "logout request failed");
        }
        self.state = FlowState::LoggedOut;
        info!("logged out");
    }
}
