use crate::api::{Channel, Guild, SearchScope};
use crate::snowflake::Snowflake;

/// Something whose messages can be searched and purged.
///
/// The variant decides which search endpoint is used and how the display name
/// was resolved; callers never branch on the kind themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Community { id: Snowflake, name: String },
    DirectMessage { id: Snowflake, name: String },
}

impl Target {
    pub fn community(guild: &Guild) -> Self {
        Target::Community {
            id: guild.id,
            name: guild.name.clone(),
        }
    }

    /// Named after its recipients, else the channel name, else the id.
    pub fn direct_message(channel: &Channel) -> Self {
        let recipients: Vec<&str> = channel
            .recipients
            .iter()
            .map(|u| u.display_name())
            .collect();
        let name = if !recipients.is_empty() {
            recipients.join(", ")
        } else if let Some(name) = channel.name.as_deref().filter(|n| !n.is_empty()) {
            name.to_string()
        } else {
            channel.id.to_string()
        };
        Target::DirectMessage {
            id: channel.id,
            name,
        }
    }

    pub fn id(&self) -> Snowflake {
        match self {
            Target::Community { id, .. } | Target::DirectMessage { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Community { name, .. } | Target::DirectMessage { name, .. } => name,
        }
    }

    pub fn search_scope(&self) -> SearchScope {
        match self {
            Target::Community { id, .. } => SearchScope::Guild(*id),
            Target::DirectMessage { id, .. } => SearchScope::Channel(*id),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Target::Community { .. } => "community",
            Target::DirectMessage { .. } => "direct message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::User;

    fn user(name: &str, global: Option<&str>) -> User {
        User {
            id: Snowflake::new(1),
            username: name.to_string(),
            global_name: global.map(str::to_string),
        }
    }

    fn dm(recipients: Vec<User>, name: Option<&str>) -> Channel {
        Channel {
            id: Snowflake::new(77),
            kind: 1,
            name: name.map(str::to_string),
            recipients,
        }
    }

    #[test]
    fn test_dm_name_joins_recipients() {
        let target = Target::direct_message(&dm(
            vec![user("alice", None), user("bob_99", Some("bob"))],
            Some("ignored"),
        ));
        assert_eq!(target.name(), "alice, bob");
    }

    #[test]
    fn test_dm_name_falls_back_to_channel_name_then_id() {
        assert_eq!(
            Target::direct_message(&dm(vec![], Some("group chat"))).name(),
            "group chat"
        );
        assert_eq!(Target::direct_message(&dm(vec![], None)).name(), "77");
        assert_eq!(Target::direct_message(&dm(vec![], Some(""))).name(), "77");
    }

    #[test]
    fn test_search_scope_follows_kind() {
        let guild = Guild {
            id: Snowflake::new(9),
            name: "Rust".to_string(),
        };
        let community = Target::community(&guild);
        assert_eq!(community.search_scope(), SearchScope::Guild(Snowflake::new(9)));
        assert_eq!(community.kind_label(), "community");

        let direct = Target::direct_message(&dm(vec![], None));
        assert_eq!(direct.search_scope(), SearchScope::Channel(Snowflake::new(77)));
        assert_eq!(direct.id(), Snowflake::new(77));
    }
}
