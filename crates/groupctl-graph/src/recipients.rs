//! Directory recipients: users, groups and other member objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::odata::strip_smtp_prefix;

/// Fields selected for every user lookup.
pub(crate) const USER_SELECT_FIELDS: &str =
    "id,displayName,mail,userPrincipalName,mailNickname,otherMails,proxyAddresses,accountEnabled";

/// Fields selected for member listings (directory objects of any type).
pub(crate) const MEMBER_SELECT_FIELDS: &str =
    "id,displayName,mail,userPrincipalName,mailNickname,proxyAddresses";

/// Kind of directory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    User,
    Group,
    Contact,
    Device,
    ServicePrincipal,
    Other,
}

impl RecipientKind {
    /// Maps an `@odata.type` annotation to a kind.
    #[must_use]
    pub fn from_odata_type(odata_type: &str) -> Self {
        match odata_type.trim_start_matches("#microsoft.graph.") {
            "user" => Self::User,
            "group" => Self::Group,
            "orgContact" => Self::Contact,
            "device" => Self::Device,
            "servicePrincipal" => Self::ServicePrincipal,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::Contact => "Contact",
            Self::Device => "Device",
            Self::ServicePrincipal => "ServicePrincipal",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Raw directory object as returned by Graph.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DirectoryObject {
    #[serde(rename = "@odata.type")]
    pub odata_type: Option<String>,
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub mail_nickname: Option<String>,
    #[serde(default)]
    pub other_mails: Vec<String>,
    #[serde(default)]
    pub proxy_addresses: Vec<String>,
}

impl DirectoryObject {
    /// Converts into a recipient; `default_kind` applies when the reply has no type annotation.
    pub(crate) fn into_recipient(self, default_kind: RecipientKind) -> Recipient {
        let kind = self
            .odata_type
            .as_deref()
            .map(RecipientKind::from_odata_type)
            .unwrap_or(default_kind);

        let mut secondary_addresses: Vec<String> = self
            .proxy_addresses
            .iter()
            .filter(|p| {
                p.len() > 5 && p.get(..5).is_some_and(|prefix| prefix.eq_ignore_ascii_case("smtp:"))
            })
            .map(|p| strip_smtp_prefix(p).to_ascii_lowercase())
            .chain(self.other_mails.iter().map(|m| m.to_ascii_lowercase()))
            .collect();
        secondary_addresses.sort();
        secondary_addresses.dedup();

        Recipient {
            id: self.id,
            kind,
            display_name: self.display_name.unwrap_or_default(),
            mail: self.mail,
            user_principal_name: self.user_principal_name,
            mail_nickname: self.mail_nickname,
            secondary_addresses,
        }
    }
}

/// A resolvable directory object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub kind: RecipientKind,
    pub display_name: String,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub mail_nickname: Option<String>,
    /// Lowercase SMTP proxy addresses and other mails, `smtp:` stripped.
    #[serde(default)]
    pub secondary_addresses: Vec<String>,
}

impl Recipient {
    /// Mail if present, UPN otherwise.
    #[must_use]
    pub fn primary_address(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .or(self.user_principal_name.as_deref())
    }

    /// Short label for listings: `Display Name <address>`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.primary_address() {
            Some(address) if !self.display_name.is_empty() => {
                format!("{} <{}>", self.display_name, address)
            }
            Some(address) => address.to_string(),
            None => format!("{} ({})", self.display_name, self.id),
        }
    }

    /// Every address the recipient answers to, lowercase.
    pub fn addresses(&self) -> impl Iterator<Item = String> + '_ {
        self.mail
            .iter()
            .chain(self.user_principal_name.iter())
            .map(|a| a.to_ascii_lowercase())
            .chain(self.secondary_addresses.iter().cloned())
    }
}
