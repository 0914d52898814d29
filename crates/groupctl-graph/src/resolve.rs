//! Resolution of free-form identifiers to directory recipients.
//!
//! An identifier may be an object id, a primary SMTP address, a UPN, an
//! `smtp:` proxy address or a bare alias. Lookups fan out over the matching
//! properties, candidates are deduplicated by object id and ranked by how
//! strongly they matched, and the outcome is unique, ambiguous or not found.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

use crate::odata::{is_email_shaped, looks_like_object_id, quote, strip_smtp_prefix, Query};
use crate::recipients::{DirectoryObject, Recipient, RecipientKind, USER_SELECT_FIELDS};
use crate::{GraphClient, GraphError, GraphResult};

/// Fields selected when groups take part in recipient resolution.
pub(crate) const GROUP_RECIPIENT_FIELDS: &str = "id,displayName,mail,mailNickname,proxyAddresses";

/// Upper bound on candidates fetched per query; more than this is ambiguous anyway.
const MAX_CANDIDATES: usize = 25;

/// A classified, normalized identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    ObjectId(String),
    Address(String),
    Alias(String),
}

impl Identifier {
    /// Normalizes and classifies raw input. Nothing remote happens here.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::InvalidIdentifier` for empty input, malformed
    /// addresses, and aliases containing whitespace.
    pub fn parse(input: &str) -> GraphResult<Self> {
        let value = strip_smtp_prefix(input.trim()).trim();
        if value.is_empty() {
            return Err(GraphError::InvalidIdentifier("identifier is empty".into()));
        }

        if looks_like_object_id(value) {
            return Ok(Self::ObjectId(value.to_ascii_lowercase()));
        }

        if value.contains('@') {
            return if is_email_shaped(value) {
                Ok(Self::Address(value.to_ascii_lowercase()))
            } else {
                Err(GraphError::InvalidIdentifier(format!(
                    "'{value}' is not a valid address"
                )))
            };
        }

        if value.chars().any(char::is_whitespace) {
            return Err(GraphError::InvalidIdentifier(format!(
                "'{value}' is not a valid alias"
            )));
        }

        Ok(Self::Alias(value.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ObjectId(v) | Self::Address(v) | Self::Alias(v) => v,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strongly a candidate matched. Ordered weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Returned by the service, but no local property matched.
    Weak,
    /// Mail nickname or UPN local part.
    Alias,
    /// A proxy address or other mail.
    Proxy,
    /// Object id, primary mail, or UPN.
    Primary,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Weak => "weak",
            Self::Alias => "alias",
            Self::Proxy => "proxy",
            Self::Primary => "primary",
        };
        f.write_str(name)
    }
}

/// A recipient with the strength of its match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub recipient: Recipient,
    pub match_kind: MatchKind,
}

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unique(Candidate),
    Ambiguous(Vec<Candidate>),
    NotFound,
}

impl Resolution {
    /// Converts ambiguity and absence into errors naming `input`.
    ///
    /// # Errors
    ///
    /// `GraphError::NotFound` or `GraphError::Ambiguous`.
    pub fn into_unique(self, input: &str) -> GraphResult<Candidate> {
        match self {
            Self::Unique(candidate) => Ok(candidate),
            Self::NotFound => Err(GraphError::NotFound(format!("no recipient matches '{input}'"))),
            Self::Ambiguous(candidates) => Err(GraphError::Ambiguous {
                input: input.to_string(),
                candidates: candidates.iter().map(|c| c.recipient.label()).collect(),
            }),
        }
    }
}

/// Options for [`GraphClient::resolve_recipient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Never pick a preferred candidate out of several.
    pub strict: bool,
    /// Also search mail-enabled groups.
    pub include_groups: bool,
}

/// User filter for an identifier; `None` for object ids (looked up directly).
#[must_use]
pub fn user_filter(identifier: &Identifier) -> Option<String> {
    match identifier {
        Identifier::ObjectId(_) => None,
        Identifier::Address(address) => {
            let q = quote(address);
            let proxy = quote(&format!("smtp:{address}"));
            Some(format!(
                "mail eq {q} or userPrincipalName eq {q} or otherMails/any(m:m eq {q}) or proxyAddresses/any(p:p eq {proxy})"
            ))
        }
        Identifier::Alias(alias) => Some(format!(
            "mailNickname eq {} or startswith(userPrincipalName,{})",
            quote(alias),
            quote(&format!("{alias}@"))
        )),
    }
}

/// Group filter for an identifier; `None` for object ids.
#[must_use]
pub fn group_filter(identifier: &Identifier) -> Option<String> {
    match identifier {
        Identifier::ObjectId(_) => None,
        Identifier::Address(address) => Some(format!(
            "mail eq {} or proxyAddresses/any(p:p eq {})",
            quote(address),
            quote(&format!("smtp:{address}"))
        )),
        Identifier::Alias(alias) => Some(format!("mailNickname eq {}", quote(alias))),
    }
}

/// Ranks how strongly `recipient` matches `identifier`.
#[must_use]
pub fn rank(identifier: &Identifier, recipient: &Recipient) -> MatchKind {
    let eq = |candidate: Option<&str>, value: &str| {
        candidate.is_some_and(|c| c.eq_ignore_ascii_case(value))
    };

    match identifier {
        Identifier::ObjectId(id) => {
            if recipient.id.eq_ignore_ascii_case(id) {
                MatchKind::Primary
            } else {
                MatchKind::Weak
            }
        }
        Identifier::Address(address) => {
            if eq(recipient.mail.as_deref(), address)
                || eq(recipient.user_principal_name.as_deref(), address)
            {
                MatchKind::Primary
            } else if recipient.secondary_addresses.iter().any(|a| a == address) {
                MatchKind::Proxy
            } else {
                MatchKind::Weak
            }
        }
        Identifier::Alias(alias) => {
            let upn_local = recipient
                .user_principal_name
                .as_deref()
                .and_then(|upn| upn.split('@').next());
            if eq(recipient.mail_nickname.as_deref(), alias) || eq(upn_local, alias) {
                MatchKind::Alias
            } else {
                MatchKind::Weak
            }
        }
    }
}

/// Deduplicates, ranks and decides.
#[must_use]
pub fn decide(identifier: &Identifier, candidates: Vec<Recipient>, strict: bool) -> Resolution {
    let mut seen = HashSet::new();
    let mut ranked: Vec<Candidate> = candidates
        .into_iter()
        .filter(|r| seen.insert(r.id.to_ascii_lowercase()))
        .map(|recipient| Candidate {
            match_kind: rank(identifier, &recipient),
            recipient,
        })
        .collect();

    // Stable: keeps service order within a tier.
    ranked.sort_by(|a, b| b.match_kind.cmp(&a.match_kind));

    match ranked.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Unique(ranked.remove(0)),
        _ if !strict && ranked[0].match_kind > ranked[1].match_kind => {
            Resolution::Unique(ranked.remove(0))
        }
        _ => Resolution::Ambiguous(ranked),
    }
}

impl GraphClient {
    /// Resolves a free-form identifier to a single recipient.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::InvalidIdentifier` before any remote call when
    /// the input is malformed, and transport or API errors from lookups.
    #[instrument(skip(self))]
    pub async fn resolve_recipient(
        &self,
        input: &str,
        options: ResolveOptions,
    ) -> GraphResult<Resolution> {
        let identifier = Identifier::parse(input)?;
        let candidates = self.find_candidates(&identifier, options.include_groups).await?;
        debug!(
            identifier = %identifier,
            candidates = candidates.len(),
            "Recipient lookup complete"
        );
        Ok(decide(&identifier, candidates, options.strict))
    }

    async fn find_candidates(
        &self,
        identifier: &Identifier,
        include_groups: bool,
    ) -> GraphResult<Vec<Recipient>> {
        let mut candidates = Vec::new();

        if let Identifier::ObjectId(id) = identifier {
            let url = self.url(&format!("/users/{id}?$select={USER_SELECT_FIELDS}"));
            if let Some(object) = self.get_optional::<DirectoryObject>(&url).await? {
                candidates.push(object.into_recipient(RecipientKind::User));
            }
            if include_groups {
                let url = self.url(&format!("/groups/{id}?$select={GROUP_RECIPIENT_FIELDS}"));
                if let Some(object) = self.get_optional::<DirectoryObject>(&url).await? {
                    candidates.push(object.into_recipient(RecipientKind::Group));
                }
            }
            return Ok(candidates);
        }

        if let Some(filter) = user_filter(identifier) {
            let query = Query::new("/users")
                .select(USER_SELECT_FIELDS)
                .filter(filter)
                .top(MAX_CANDIDATES as u32)
                .count();
            let users: Vec<DirectoryObject> = self.collect(&query, Some(MAX_CANDIDATES)).await?;
            candidates.extend(users.into_iter().map(|o| o.into_recipient(RecipientKind::User)));
        }

        if include_groups {
            if let Some(filter) = group_filter(identifier) {
                let query = Query::new("/groups")
                    .select(GROUP_RECIPIENT_FIELDS)
                    .filter(filter)
                    .top(MAX_CANDIDATES as u32)
                    .count();
                let groups: Vec<DirectoryObject> =
                    self.collect(&query, Some(MAX_CANDIDATES)).await?;
                candidates
                    .extend(groups.into_iter().map(|o| o.into_recipient(RecipientKind::Group)));
            }
        }

        Ok(candidates)
    }
}
