//! Group lookup, lifecycle and membership operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument};

use crate::odata::{is_email_shaped, looks_like_object_id, quote, strip_smtp_prefix, Query};
use crate::recipients::{DirectoryObject, Recipient, RecipientKind, MEMBER_SELECT_FIELDS};
use crate::{GraphClient, GraphError, GraphResult};

const GROUP_SELECT_FIELDS: &str = "id,displayName,description,mail,mailNickname,groupTypes,\
    securityEnabled,mailEnabled,proxyAddresses,createdDateTime";

/// Longest mail nickname Exchange accepts.
pub const MAX_MAIL_NICKNAME_LEN: usize = 64;

/// Group type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Microsoft 365 group.
    Microsoft365,
    /// Security group.
    Security,
    /// Distribution list.
    Distribution,
    /// Mail-enabled security group.
    MailEnabledSecurity,
    Unknown,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Microsoft365 => "Microsoft 365",
            Self::Security => "Security",
            Self::Distribution => "Distribution list",
            Self::MailEnabledSecurity => "Mail-enabled security",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A directory group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub description: Option<String>,
    pub mail: Option<String>,
    pub mail_nickname: Option<String>,
    #[serde(default)]
    pub group_types: Vec<String>,
    #[serde(default)]
    pub security_enabled: bool,
    #[serde(default)]
    pub mail_enabled: bool,
    #[serde(default)]
    pub proxy_addresses: Vec<String>,
    /// Only populated for Microsoft 365 groups fetched by id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_from_address_lists: Option<bool>,
    pub created_date_time: Option<DateTime<Utc>>,
}

impl Group {
    /// Derives the group type from Graph properties.
    #[must_use]
    pub fn kind(&self) -> GroupKind {
        if self.group_types.iter().any(|t| t == "Unified") {
            GroupKind::Microsoft365
        } else if self.security_enabled && self.mail_enabled {
            GroupKind::MailEnabledSecurity
        } else if self.security_enabled {
            GroupKind::Security
        } else if self.mail_enabled {
            GroupKind::Distribution
        } else {
            GroupKind::Unknown
        }
    }

    /// Whether membership is rule-based (members cannot be added).
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.group_types.iter().any(|t| t == "DynamicMembership")
    }

    /// `Display Name <mail>` or `Display Name (id)`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.mail.as_deref() {
            Some(mail) => format!("{} <{}>", self.display_name, mail),
            None => format!("{} ({})", self.display_name, self.id),
        }
    }

    /// True when `value` equals the group's mail, nickname or an SMTP proxy.
    fn matches_address(&self, value: &str) -> bool {
        let eq = |candidate: Option<&str>| candidate.is_some_and(|c| c.eq_ignore_ascii_case(value));
        eq(self.mail.as_deref())
            || eq(self.mail_nickname.as_deref())
            || self
                .proxy_addresses
                .iter()
                .any(|p| strip_smtp_prefix(p).eq_ignore_ascii_case(value))
    }
}

/// Kinds of group that can be created through Graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewGroupKind {
    Microsoft365,
    Security,
}

/// Body for `POST /groups`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub display_name: String,
    pub mail_nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub group_types: Vec<String>,
    pub mail_enabled: bool,
    pub security_enabled: bool,
    #[serde(rename = "owners@odata.bind", skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

impl CreateGroupRequest {
    #[must_use]
    pub fn new(display_name: &str, mail_nickname: &str, kind: NewGroupKind) -> Self {
        let (group_types, mail_enabled, security_enabled) = match kind {
            NewGroupKind::Microsoft365 => (vec!["Unified".to_string()], true, false),
            NewGroupKind::Security => (Vec::new(), false, true),
        };
        Self {
            display_name: display_name.to_string(),
            mail_nickname: mail_nickname.to_string(),
            description: None,
            group_types,
            mail_enabled,
            security_enabled,
            owners: Vec::new(),
        }
    }

    /// Binds an owner by object id.
    pub fn add_owner(&mut self, base_url: &str, owner_id: &str) {
        self.owners.push(format!("{base_url}/users/{owner_id}"));
    }
}

/// Outcome of adding one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyMember,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressListFlag {
    hide_from_address_lists: Option<bool>,
}

/// Derives a mail nickname from a display name.
///
/// Keeps ASCII letters, digits, `-`, `_` and `.`; drops everything else.
#[must_use]
pub fn derive_mail_nickname(display_name: &str) -> String {
    let nickname: String = display_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let nickname = collapse_dots(&nickname);
    let trimmed = nickname.trim_matches('.');
    let truncated: String = trimmed.chars().take(MAX_MAIL_NICKNAME_LEN).collect();
    truncated.trim_end_matches('.').to_string()
}

fn collapse_dots(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Validates a caller-supplied mail nickname.
///
/// # Errors
///
/// `GraphError::InvalidIdentifier` describing the first rule broken.
pub fn validate_mail_nickname(nickname: &str) -> GraphResult<()> {
    if nickname.is_empty() {
        return Err(GraphError::InvalidIdentifier(
            "mail nickname is empty; pass --alias with letters or digits".into(),
        ));
    }
    if nickname.len() > MAX_MAIL_NICKNAME_LEN {
        return Err(GraphError::InvalidIdentifier(format!(
            "mail nickname '{nickname}' exceeds {MAX_MAIL_NICKNAME_LEN} characters"
        )));
    }
    if let Some(c) = nickname
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(GraphError::InvalidIdentifier(format!(
            "mail nickname '{nickname}' contains invalid character '{c}'"
        )));
    }
    if nickname.starts_with('.') || nickname.ends_with('.') || nickname.contains("..") {
        return Err(GraphError::InvalidIdentifier(format!(
            "mail nickname '{nickname}' has a misplaced '.'"
        )));
    }
    Ok(())
}

impl GraphClient {
    /// Fetches a group by object id, including the address-list flag for Microsoft 365 groups.
    #[instrument(skip(self))]
    pub async fn get_group(&self, id: &str) -> GraphResult<Group> {
        let url = self.url(&format!("/groups/{id}?$select={GROUP_SELECT_FIELDS}"));
        let mut group: Group = self
            .get_optional(&url)
            .await?
            .ok_or_else(|| GraphError::NotFound(format!("group '{id}'")))?;

        if group.kind() == GroupKind::Microsoft365 {
            let url = self.url(&format!("/groups/{id}?$select=hideFromAddressLists"));
            let flag: AddressListFlag = self.get(&url).await?;
            group.hide_from_address_lists = flag.hide_from_address_lists;
        }

        Ok(group)
    }

    /// Finds every group matching an id, address, nickname or display name.
    ///
    /// # Errors
    ///
    /// `GraphError::InvalidIdentifier` for empty input or a malformed address.
    #[instrument(skip(self))]
    pub async fn find_groups(&self, identity: &str) -> GraphResult<Vec<Group>> {
        let value = strip_smtp_prefix(identity.trim()).trim();
        if value.is_empty() {
            return Err(GraphError::InvalidIdentifier("group identity is empty".into()));
        }

        if looks_like_object_id(value) {
            return match self.get_group(value).await {
                Ok(group) => Ok(vec![group]),
                Err(e) if e.is_not_found() => Ok(Vec::new()),
                Err(e) => Err(e),
            };
        }

        let query = if value.contains('@') {
            if !is_email_shaped(value) {
                return Err(GraphError::InvalidIdentifier(format!(
                    "'{value}' is not a valid address"
                )));
            }
            Query::new("/groups")
                .select(GROUP_SELECT_FIELDS)
                .filter(format!(
                    "mail eq {} or proxyAddresses/any(p:p eq {})",
                    quote(value),
                    quote(&format!("smtp:{value}"))
                ))
                .count()
        } else {
            Query::new("/groups").select(GROUP_SELECT_FIELDS).filter(format!(
                "mailNickname eq {q} or displayName eq {q}",
                q = quote(value)
            ))
        };

        self.collect(&query.top(self.page_size()), Some(self.page_size() as usize))
            .await
    }

    /// Looks up exactly one group.
    ///
    /// Several matches resolve to the single one whose mail, nickname or
    /// proxy address equals the input; otherwise the lookup is ambiguous.
    ///
    /// # Errors
    ///
    /// `GraphError::NotFound`, `GraphError::Ambiguous`, or lookup errors.
    pub async fn lookup_group(&self, identity: &str) -> GraphResult<Group> {
        let mut groups = self.find_groups(identity).await?;
        let value = strip_smtp_prefix(identity.trim()).trim().to_string();

        let chosen = match groups.len() {
            0 => return Err(GraphError::NotFound(format!("no group matches '{value}'"))),
            1 => groups.remove(0),
            _ => {
                let exact: Vec<usize> = groups
                    .iter()
                    .enumerate()
                    .filter(|(_, g)| g.matches_address(&value))
                    .map(|(i, _)| i)
                    .collect();
                if exact.len() == 1 {
                    groups.swap_remove(exact[0])
                } else {
                    return Err(GraphError::Ambiguous {
                        input: value,
                        candidates: groups.iter().map(Group::label).collect(),
                    });
                }
            }
        };

        if chosen.kind() == GroupKind::Microsoft365 && chosen.hide_from_address_lists.is_none() {
            self.get_group(&chosen.id).await
        } else {
            Ok(chosen)
        }
    }

    /// Lists groups, optionally restricted to a display-name prefix.
    #[instrument(skip(self))]
    pub async fn list_groups(&self, prefix: Option<&str>, limit: usize) -> GraphResult<Vec<Group>> {
        let mut query = Query::new("/groups").select(GROUP_SELECT_FIELDS);
        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            query = query.filter(format!("startswith(displayName,{})", quote(prefix)));
        }
        let top = limit.clamp(1, self.page_size() as usize) as u32;
        self.collect(&query.top(top), Some(limit)).await
    }

    /// Groups already using a nickname or display name.
    pub async fn find_conflicting_groups(
        &self,
        mail_nickname: &str,
        display_name: &str,
    ) -> GraphResult<Vec<Group>> {
        let query = Query::new("/groups")
            .select(GROUP_SELECT_FIELDS)
            .filter(format!(
                "mailNickname eq {} or displayName eq {}",
                quote(mail_nickname),
                quote(display_name)
            ))
            .top(10);
        self.collect(&query, Some(10)).await
    }

    /// Creates a group.
    #[instrument(skip(self, request), fields(mail_nickname = %request.mail_nickname))]
    pub async fn create_group(&self, request: &CreateGroupRequest) -> GraphResult<Group> {
        info!("Creating group: {}", request.display_name);
        let group: Group = self.post(&self.url("/groups"), request).await?;
        info!("Group created with ID: {}", group.id);
        Ok(group)
    }

    /// Deletes a group (moves it to the recycle bin).
    #[instrument(skip(self))]
    pub async fn delete_group(&self, id: &str) -> GraphResult<()> {
        self.delete(&self.url(&format!("/groups/{id}"))).await?;
        info!("Group deleted: {}", id);
        Ok(())
    }

    /// Sets GAL visibility; returns `false` when the value was already in place.
    ///
    /// # Errors
    ///
    /// `GraphError::Unsupported` for anything but Microsoft 365 groups.
    #[instrument(skip(self, group), fields(group_id = %group.id))]
    pub async fn set_hidden_from_address_lists(&self, group: &Group, hidden: bool) -> GraphResult<bool> {
        if group.kind() != GroupKind::Microsoft365 {
            return Err(GraphError::Unsupported(format!(
                "address list visibility can only be changed on Microsoft 365 groups; '{}' is a {} group",
                group.display_name,
                group.kind()
            )));
        }
        if group.hide_from_address_lists == Some(hidden) {
            debug!("Address list visibility already set");
            return Ok(false);
        }

        let body = serde_json::json!({ "hideFromAddressLists": hidden });
        self.patch(&self.url(&format!("/groups/{}", group.id)), &body)
            .await?;
        Ok(true)
    }

    /// Counts direct or transitive members.
    pub async fn member_count(&self, group_id: &str, transitive: bool) -> GraphResult<u64> {
        let relation = members_relation(transitive);
        self.get_count(&self.url(&format!("/groups/{group_id}/{relation}/$count")))
            .await
    }

    /// Lists direct or transitive members.
    #[instrument(skip(self))]
    pub async fn list_members(&self, group_id: &str, transitive: bool) -> GraphResult<Vec<Recipient>> {
        let relation = members_relation(transitive);
        let query = Query::new(format!("/groups/{group_id}/{relation}"))
            .select(MEMBER_SELECT_FIELDS)
            .top(self.page_size());
        let objects: Vec<DirectoryObject> = self.collect(&query, None).await?;
        Ok(objects
            .into_iter()
            .map(|o| o.into_recipient(RecipientKind::Other))
            .collect())
    }

    /// Adds a member by object id. An existing membership is not an error.
    #[instrument(skip(self))]
    pub async fn add_member(&self, group_id: &str, member_id: &str) -> GraphResult<AddOutcome> {
        let body = serde_json::json!({
            "@odata.id": format!("{}/directoryObjects/{}", self.base_url(), member_id)
        });
        let url = self.url(&format!("/groups/{group_id}/members/$ref"));

        match self.post_no_content(&url, &body).await {
            Ok(()) => Ok(AddOutcome::Added),
            Err(e) if e.is_already_exists() => Ok(AddOutcome::AlreadyMember),
            Err(e) => Err(e),
        }
    }
}

fn members_relation(transitive: bool) -> &'static str {
    if transitive {
        "transitiveMembers"
    } else {
        "members"
    }
}
