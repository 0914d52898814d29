//! Microsoft Graph client for group and recipient administration.
//!
//! Covers what the `groupctl` commands need and nothing more:
//!
//! - `OAuth2` client credentials authentication
//! - Group lookup, creation, deletion and address-list visibility
//! - Membership listing and idempotent member addition
//! - Recipient resolution across mail, UPN, other mails and proxy addresses
//! - Multi-cloud endpoints (Commercial, US Government, China, Germany)
//!
//! # Example
//!
//! ```no_run
//! use groupctl_graph::{GraphClient, GraphConfig, GraphCredentials, ResolveOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GraphConfig::builder().tenant_id("contoso.onmicrosoft.com").build()?;
//! let credentials = GraphCredentials {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string().into(),
//! };
//!
//! let client = GraphClient::new(&config, credentials)?;
//! let group = client.lookup_group("sales@contoso.com").await?;
//! let member = client
//!     .resolve_recipient("jdoe", ResolveOptions::default())
//!     .await?
//!     .into_unique("jdoe")?;
//! client.add_member(&group.id, &member.recipient.id).await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod error;
mod graph_client;
mod groups;
mod membership;
pub mod odata;
mod organization;
mod recipients;
mod resolve;

pub use auth::TokenCache;
pub use config::{CloudEnvironment, GraphConfig, GraphConfigBuilder, GraphCredentials};
pub use error::{GraphError, GraphResult};
pub use graph_client::GraphClient;
pub use groups::{
    derive_mail_nickname, validate_mail_nickname, AddOutcome, CreateGroupRequest, Group,
    GroupKind, NewGroupKind, MAX_MAIL_NICKNAME_LEN,
};
pub use membership::MembershipSnapshot;
pub use organization::{Organization, VerifiedDomain};
pub use recipients::{Recipient, RecipientKind};
pub use resolve::{
    decide, group_filter, rank, user_filter, Candidate, Identifier, MatchKind, Resolution,
    ResolveOptions,
};
