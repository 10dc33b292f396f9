//! Mapping between lobby-side identities and room-side puppets.
//!
//! Puppets are named `<namespace>_<username>` for native lobby users and
//! `<namespace>_<network>=<username>` for users the lobby itself learned about
//! through another bridge. Lobby names cannot contain `=`, so both forms decode
//! unambiguously.
//!
//! Genuine room users are mapped the other way through an ordered table of
//! relay rules: the first rule whose prefix matches the localpart decides the
//! network tag and the username. Users matching no rule are reported under
//! their homeserver's domain.

use tracing::debug;

use crate::common::types::{truncate_lobby_name, RemoteIdentity};
use crate::config::types::{Config, RelayConfig};
use crate::identity::user_id::UserId;

/// Separator between network tag and username in relayed puppet names.
const NETWORK_SEPARATOR: char = '=';

/// A third-party relay whose localparts embed a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRule {
    pub prefix: String,
    pub network: String,
}

impl From<&RelayConfig> for RelayRule {
    fn from(config: &RelayConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            network: config.network.clone(),
        }
    }
}

/// Pure identity derivation. Holds no state besides configuration.
#[derive(Debug, Clone)]
pub struct IdentityCodec {
    namespace: String,
    server_name: String,
    lobby_network: String,
    relays: Vec<RelayRule>,
}

impl IdentityCodec {
    pub fn new(
        namespace: impl Into<String>,
        server_name: impl Into<String>,
        lobby_network: impl Into<String>,
        relays: Vec<RelayRule>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            server_name: server_name.into(),
            lobby_network: lobby_network.into().to_lowercase(),
            relays,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.appservice.namespace,
            &config.homeserver.domain,
            &config.lobby.network,
            config.bridge.relays.iter().map(RelayRule::from).collect(),
        )
    }

    /// The localpart prefix marking bridge-owned identities.
    pub fn puppet_prefix(&self) -> String {
        format!("{}_", self.namespace)
    }

    /// Network tag given to native lobby users.
    pub fn lobby_network(&self) -> &str {
        &self.lobby_network
    }

    /// True if the user is one of our own puppets and must never be bridged back.
    pub fn is_bridge_owned(&self, user: &UserId) -> bool {
        user.localpart().starts_with(&self.puppet_prefix())
    }

    /// Puppet id for a lobby-side identity.
    ///
    /// The username is lowercased and truncated to the lobby limit, so the
    /// same lobby user always maps to the same puppet. The router only ever
    /// passes [`lobby_network`](Self::lobby_network); the `<network>=` form is
    /// reserved for lobby users the server itself relays from another network,
    /// so `decode` can hand their network tag back.
    pub fn encode(&self, network: &str, username: &str) -> UserId {
        let username = truncate_lobby_name(&username.to_lowercase());
        let network = network.to_lowercase();
        let localpart = if network == self.lobby_network {
            format!("{}{}", self.puppet_prefix(), username)
        } else {
            format!(
                "{}{}{}{}",
                self.puppet_prefix(),
                network,
                NETWORK_SEPARATOR,
                username
            )
        };
        UserId::new(localpart, &self.server_name)
    }

    /// Lobby-side identity behind a puppet id, or `None` if the id is not ours.
    pub fn decode(&self, user: &UserId) -> Option<RemoteIdentity> {
        let rest = user.localpart().strip_prefix(&self.puppet_prefix())?;
        if rest.is_empty() {
            return None;
        }
        match rest.split_once(NETWORK_SEPARATOR) {
            Some((network, username)) if !network.is_empty() && !username.is_empty() => {
                Some(RemoteIdentity::new(network, username))
            }
            Some(_) => None,
            None => Some(RemoteIdentity::new(&self.lobby_network, rest)),
        }
    }

    /// Lobby-side identity for a genuine room user.
    pub fn derive(&self, user: &UserId) -> RemoteIdentity {
        let localpart = user.localpart();
        for rule in &self.relays {
            if let Some(stripped) = localpart.strip_prefix(rule.prefix.as_str()) {
                if stripped.is_empty() {
                    continue;
                }
                debug!(user = %user, network = %rule.network, "Matched relay rule");
                return RemoteIdentity::new(&rule.network, truncate_lobby_name(stripped));
            }
        }
        RemoteIdentity::new(network_tag(user.server()), truncate_lobby_name(localpart))
    }

    /// Lobby-safe display name, falling back to the username when nothing usable remains.
    pub fn display_name(&self, raw: Option<&str>, username: &str) -> String {
        let sanitized = raw.map(sanitize_display_name).unwrap_or_default();
        if sanitized.is_empty() {
            truncate_lobby_name(username)
        } else {
            sanitized
        }
    }
}

/// Network tag for a homeserver domain.
fn network_tag(server: &str) -> String {
    truncate_lobby_name(&server.replace('-', "_"))
}

fn sanitize_display_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
    truncate_lobby_name(&trimmed.replace(['-', '.'], "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdentityCodec {
        IdentityCodec::new(
            "spring",
            "example.org",
            "springlobby",
            vec![
                RelayRule {
                    prefix: "_discord_".to_string(),
                    network: "discord".to_string(),
                },
                RelayRule {
                    prefix: "freenode_".to_string(),
                    network: "freenode.org".to_string(),
                },
            ],
        )
    }

    fn user(s: &str) -> UserId {
        s.parse().unwrap()
    }

    #[test]
    fn test_encode_native_user() {
        let id = codec().encode("springlobby", "Alice");
        assert_eq!(id.to_string(), "@spring_alice:example.org");
    }

    #[test]
    fn test_encode_relayed_user() {
        let id = codec().encode("discord", "Charlie");
        assert_eq!(id.to_string(), "@spring_discord=charlie:example.org");
    }

    #[test]
    fn test_round_trip_short_names() {
        let codec = codec();
        for (network, name) in [
            ("springlobby", "alice"),
            ("springlobby", "BoB_2"),
            ("discord", "charlie"),
            ("freenode.org", "exactly15chars_"),
            ("matrix.org", "x"),
        ] {
            let decoded = codec.decode(&codec.encode(network, name)).unwrap();
            assert_eq!(decoded, RemoteIdentity::new(network, name.to_lowercase()));
        }
    }

    #[test]
    fn test_round_trip_long_name_is_truncated() {
        let codec = codec();
        let decoded = codec
            .decode(&codec.encode("springlobby", "AVeryLongLobbyUserName"))
            .unwrap();
        assert_eq!(decoded.username, "averylonglobbyu");
        assert_eq!(decoded.username.chars().count(), 15);
    }

    #[test]
    fn test_decode_rejects_foreign_ids() {
        let codec = codec();
        assert!(codec.decode(&user("@bob:example.org")).is_none());
        assert!(codec.decode(&user("@spring_:example.org")).is_none());
        assert!(codec.decode(&user("@spring_=bob:example.org")).is_none());
        assert!(codec.decode(&user("@springer:example.org")).is_none());
    }

    #[test]
    fn test_is_bridge_owned() {
        let codec = codec();
        assert!(codec.is_bridge_owned(&user("@spring_alice:example.org")));
        assert!(codec.is_bridge_owned(&user("@spring_alice:elsewhere.net")));
        assert!(!codec.is_bridge_owned(&user("@bob:example.org")));
    }

    #[test]
    fn test_derive_relay_rules_in_order() {
        let codec = codec();
        assert_eq!(
            codec.derive(&user("@_discord_charlie:example.org")),
            RemoteIdentity::new("discord", "charlie")
        );
        assert_eq!(
            codec.derive(&user("@freenode_dave:example.org")),
            RemoteIdentity::new("freenode.org", "dave")
        );
    }

    #[test]
    fn test_derive_strips_prefix_not_characters() {
        // Usernames that begin with letters of the prefix keep them
        assert_eq!(
            codec().derive(&user("@_discord_discobot:example.org")),
            RemoteIdentity::new("discord", "discobot")
        );
        assert_eq!(
            codec().derive(&user("@freenode_free:example.org")),
            RemoteIdentity::new("freenode.org", "free")
        );
    }

    #[test]
    fn test_derive_falls_back_to_homeserver() {
        assert_eq!(
            codec().derive(&user("@bob:my-server.org")),
            RemoteIdentity::new("my_server.org", "bob")
        );
        assert_eq!(
            codec().derive(&user("@averyveryverylongname:matrix.org")).username,
            "averyveryverylo"
        );
    }

    #[test]
    fn test_display_name_sanitation() {
        let codec = codec();
        assert_eq!(codec.display_name(Some("@Bob.Smith-Jr"), "bob"), "Bob_Smith_Jr");
        assert_eq!(
            codec.display_name(Some("A display name far too long"), "bob"),
            "A display name "
        );
        assert_eq!(codec.display_name(Some(""), "bob"), "bob");
        assert_eq!(codec.display_name(Some("@"), "bob"), "bob");
        assert_eq!(codec.display_name(None, "averyveryverylongname"), "averyveryverylo");
    }
}
