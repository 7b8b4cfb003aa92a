//
//  gerrit-rest
//  api/query.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Change Queries and Capability Degradation
//!
//! The Gerrit REST surface is not uniform across the range of server
//! versions a client has to support: older servers reject the `S` start
//! offset, and each release grew the set of `o=` output options. Rather
//! than probing the server version (brittle and not always exposed), the
//! [`QueryRunner`] treats "the server rejected this shape of request" as
//! the signal to narrow capabilities live:
//!
//! - a 400 whose body points at the start offset drops the offset and
//!   relies on the sort-key continuation embedded in the records;
//! - a 400 whose body names requested options removes exactly those
//!   options.
//!
//! Each rule fires at most once per [`QueryRunner::run`] call; a second
//! rejection of the same kind is surfaced unchanged so a permanently
//! misconfigured server cannot cause a retry loop.
//!
//! Error bodies are matched with [`IncompatibilitySignatures`] - plain
//! configurable regexes, because the exact phrasing is server-version
//! dependent and not a contract.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::changes::ChangePage;
use crate::api::client::GerritClient;
use crate::api::error::GerritError;

/// Output options for `/changes/` queries, rendered as `o=` parameters.
///
/// Each variant asks the server to enrich returned change records with an
/// additional section. Older servers reject options they do not know;
/// see [`QueryRunner`] for how that is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListChangesOption {
    /// Label summaries for each change.
    Labels,
    /// Detailed label info including approver accounts.
    DetailedLabels,
    /// Only the current revision of each change.
    CurrentRevision,
    /// All revisions (patch sets) of each change.
    AllRevisions,
    /// Commit metadata of the current revision.
    CurrentCommit,
    /// Commit metadata of all revisions.
    AllCommits,
    /// File list of the current revision.
    CurrentFiles,
    /// File lists of all revisions.
    AllFiles,
    /// Full name/email/username for all involved accounts.
    DetailedAccounts,
    /// Change messages (the review conversation).
    Messages,
    /// Actions the caller may perform on the current revision.
    CurrentActions,
    /// The caller's reviewed flag on each change.
    Reviewed,
    /// Fetch/download command info per revision.
    DownloadCommands,
    /// The caller's draft comments.
    DraftComments,
}

impl ListChangesOption {
    /// The wire form sent in the `o=` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labels => "LABELS",
            Self::DetailedLabels => "DETAILED_LABELS",
            Self::CurrentRevision => "CURRENT_REVISION",
            Self::AllRevisions => "ALL_REVISIONS",
            Self::CurrentCommit => "CURRENT_COMMIT",
            Self::AllCommits => "ALL_COMMITS",
            Self::CurrentFiles => "CURRENT_FILES",
            Self::AllFiles => "ALL_FILES",
            Self::DetailedAccounts => "DETAILED_ACCOUNTS",
            Self::Messages => "MESSAGES",
            Self::CurrentActions => "CURRENT_ACTIONS",
            Self::Reviewed => "REVIEWED",
            Self::DownloadCommands => "DOWNLOAD_COMMANDS",
            Self::DraftComments => "DRAFT_COMMENTS",
        }
    }
}

impl fmt::Display for ListChangesOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical `/changes/` query: free-text query, requested options,
/// page size and continuation state.
///
/// The descriptor lives for the duration of one paginated query. Only the
/// [`QueryRunner`] mutates its capability fields, and only when a
/// degradation rule fires; the pagination fields (offset, sort key) are
/// refreshed by the cursor before each page fetch.
#[derive(Debug, Clone)]
pub struct ChangesQuery {
    query: String,
    options: BTreeSet<ListChangesOption>,
    limit: u32,
    start: Option<u32>,
    sort_key: Option<String>,
    offset_supported: bool,
}

impl ChangesQuery {
    /// Creates a descriptor for `query` with the given options and page
    /// size.
    pub fn new(
        query: impl Into<String>,
        options: impl IntoIterator<Item = ListChangesOption>,
        limit: u32,
    ) -> Self {
        Self {
            query: query.into(),
            options: options.into_iter().collect(),
            limit,
            start: None,
            sort_key: None,
            offset_supported: true,
        }
    }

    /// The free-text query string (e.g. `is:open`).
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The currently requested options.
    pub fn options(&self) -> &BTreeSet<ListChangesOption> {
        &self.options
    }

    /// The page size sent as `n=`.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether an offset would currently be sent.
    pub fn has_offset(&self) -> bool {
        self.start.is_some()
    }

    pub(crate) fn set_start(&mut self, start: u32) {
        self.start = if self.offset_supported && start > 0 {
            Some(start)
        } else {
            None
        };
    }

    pub(crate) fn set_sort_key(&mut self, sort_key: Option<String>) {
        self.sort_key = sort_key;
    }

    pub(crate) fn drop_offset(&mut self) {
        self.start = None;
        self.offset_supported = false;
    }

    pub(crate) fn drop_options(&mut self, dropped: &[ListChangesOption]) {
        for option in dropped {
            self.options.remove(option);
        }
    }

    /// Renders the request path with an encoded query string.
    ///
    /// The offset travels as `S=`, the sort-key continuation as `N=`, the
    /// page size as `n=` and each option as a repeated `o=` value.
    pub fn to_path(&self) -> String {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        pairs.append_pair("q", &self.query);
        pairs.append_pair("n", &self.limit.to_string());
        if let Some(start) = self.start {
            pairs.append_pair("S", &start.to_string());
        }
        if let Some(sort_key) = &self.sort_key {
            pairs.append_pair("N", sort_key);
        }
        for option in &self.options {
            pairs.append_pair("o", option.as_str());
        }
        format!("/changes/?{}", pairs.finish())
    }
}

/// A capability-narrowing mutation derived from a server rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeAction {
    /// Stop sending the `S=` start offset.
    DropOffset,
    /// Remove exactly these options from the query.
    DropOptions(Vec<ListChangesOption>),
}

static DEFAULT_OFFSET_UNSUPPORTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-S\b|sort_?key").expect("offset pattern must compile"));

static DEFAULT_OPTION_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-o\b").expect("option pattern must compile"));

/// Patterns recognizing version-incompatibility rejections.
///
/// The exact error phrasing varies across server versions, so the patterns
/// are configuration with sensible defaults, not hard-coded invariants.
#[derive(Debug, Clone)]
pub struct IncompatibilitySignatures {
    offset_unsupported: Regex,
    option_flag: Regex,
}

impl IncompatibilitySignatures {
    /// Creates signatures from custom patterns.
    ///
    /// `offset_unsupported` recognizes rejections of the start offset;
    /// `option_flag` recognizes rejections that name query options (the
    /// offending option names are then matched literally against the
    /// requested set).
    pub fn new(offset_unsupported: Regex, option_flag: Regex) -> Self {
        Self {
            offset_unsupported,
            option_flag,
        }
    }
}

impl Default for IncompatibilitySignatures {
    fn default() -> Self {
        Self {
            offset_unsupported: DEFAULT_OFFSET_UNSUPPORTED.clone(),
            option_flag: DEFAULT_OPTION_FLAG.clone(),
        }
    }
}

/// Classifies a failed response into an optional degradation action.
///
/// Pure: the decision is a function of the status code, the error body and
/// the current query shape, which keeps the matching unit-testable without
/// a live server. Only 400-class rejections are ever classified.
pub fn classify_incompatibility(
    signatures: &IncompatibilitySignatures,
    status: u16,
    body: &str,
    query: &ChangesQuery,
) -> Option<DegradeAction> {
    if status != 400 {
        return None;
    }

    if signatures.option_flag.is_match(body) {
        let dropped: Vec<ListChangesOption> = query
            .options()
            .iter()
            .copied()
            .filter(|option| body.contains(option.as_str()))
            .collect();
        if !dropped.is_empty() {
            return Some(DegradeAction::DropOptions(dropped));
        }
    }

    if query.has_offset() && signatures.offset_unsupported.is_match(body) {
        return Some(DegradeAction::DropOffset);
    }

    None
}

/// Runs one logical changes query, degrading capabilities on known
/// version-incompatibility rejections.
///
/// Wraps a [`GerritClient`] and owns the signature configuration. Each
/// degradation rule (offset, options) resubmits at most once per `run`
/// call; any other failure - and any repeat failure - is surfaced to the
/// caller untouched.
pub struct QueryRunner {
    client: GerritClient,
    signatures: IncompatibilitySignatures,
}

impl QueryRunner {
    /// Wraps a client with the default signatures.
    pub fn new(client: GerritClient) -> Self {
        Self {
            client,
            signatures: IncompatibilitySignatures::default(),
        }
    }

    /// Replaces the incompatibility signatures.
    pub fn with_signatures(mut self, signatures: IncompatibilitySignatures) -> Self {
        self.signatures = signatures;
        self
    }

    /// Fetches one page for the descriptor, degrading it if needed.
    ///
    /// On a 400 rejection matching a known signature the descriptor is
    /// mutated (offset dropped, or the named options removed) and the
    /// query resubmitted; the mutation is permanent for the descriptor's
    /// lifetime, so later pages of the same query do not re-trigger it.
    ///
    /// # Errors
    ///
    /// Any error that does not match a signature, and any error from a
    /// resubmission whose rule already fired, is returned unchanged.
    pub async fn run(&self, query: &mut ChangesQuery) -> Result<ChangePage, GerritError> {
        let mut offset_rule_spent = false;
        let mut options_rule_spent = false;

        loop {
            let err = match self.fetch(query).await {
                Ok(page) => return Ok(page),
                Err(err) => err,
            };

            let action = match &err {
                GerritError::Status { code, body, .. } => {
                    classify_incompatibility(&self.signatures, *code, body, query)
                }
                _ => None,
            };

            match action {
                Some(DegradeAction::DropOffset) if !offset_rule_spent => {
                    offset_rule_spent = true;
                    tracing::debug!("server rejected the start offset, retrying without it");
                    query.drop_offset();
                }
                Some(DegradeAction::DropOptions(dropped)) if !options_rule_spent => {
                    options_rule_spent = true;
                    tracing::debug!(options = ?dropped, "server rejected query options, retrying without them");
                    query.drop_options(&dropped);
                }
                _ => return Err(err),
            }
        }
    }

    async fn fetch(&self, query: &ChangesQuery) -> Result<ChangePage, GerritError> {
        match self.client.get_request(&query.to_path()).await? {
            Some(value) => ChangePage::from_value(value),
            None => Ok(ChangePage::empty()),
        }
    }
}
