use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::notification::{Notification, NotificationType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    /// Notifications of type `system`.
    System,
    /// Messages mentioning "request".
    Request,
    /// Messages mentioning "gear".
    Gear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    System,
    Announcements,
}

/// Query parameters selecting an inbox view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub filter: ReadFilter,
    #[serde(default, rename = "type")]
    pub type_filter: TypeFilter,
    #[serde(default)]
    pub tab: Tab,
}

impl ReadFilter {
    pub fn admits(&self, is_read: bool) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Unread => !is_read,
        }
    }
}

impl TypeFilter {
    pub fn admits(&self, n: &Notification) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::System => n.r#type == NotificationType::System,
            TypeFilter::Request => n.message.to_lowercase().contains("request"),
            TypeFilter::Gear => n.message.to_lowercase().contains("gear"),
        }
    }
}

impl Tab {
    pub fn shows_notifications(&self) -> bool {
        !matches!(self, Tab::Announcements)
    }

    pub fn shows_announcements(&self) -> bool {
        !matches!(self, Tab::System)
    }
}

impl InboxQuery {
    pub fn admits_notification(&self, n: &Notification, is_read: bool) -> bool {
        let tab_matches = match self.tab {
            Tab::All => true,
            Tab::System => n.r#type == NotificationType::System,
            Tab::Announcements => false,
        };
        tab_matches && self.filter.admits(is_read) && self.type_filter.admits(n)
    }

    pub fn admits_announcement(&self, is_read: bool) -> bool {
        self.tab.shows_announcements() && self.filter.admits(is_read)
    }
}

impl FromStr for ReadFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReadFilter::All),
            "unread" => Ok(ReadFilter::Unread),
            other => Err(format!("unknown filter '{}': expected all or unread", other)),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TypeFilter::All),
            "system" => Ok(TypeFilter::System),
            "request" => Ok(TypeFilter::Request),
            "gear" => Ok(TypeFilter::Gear),
            other => Err(format!(
                "unknown type filter '{}': expected all, system, request or gear",
                other
            )),
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Tab::All),
            "system" => Ok(Tab::System),
            "announcements" => Ok(Tab::Announcements),
            other => Err(format!(
                "unknown tab '{}': expected all, system or announcements",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn notification(r#type: NotificationType, message: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: None,
            r#type,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_announcements_tab_hides_every_notification() {
        let q = InboxQuery {
            tab: Tab::Announcements,
            ..Default::default()
        };
        let n = notification(NotificationType::System, "maintenance tonight");
        assert!(!q.admits_notification(&n, false));
        assert!(q.admits_announcement(false));
    }

    #[test]
    fn test_system_tab_hides_announcements_and_other_types() {
        let q = InboxQuery {
            tab: Tab::System,
            ..Default::default()
        };
        assert!(!q.admits_announcement(false));
        assert!(q.admits_notification(&notification(NotificationType::System, "x"), true));
        assert!(!q.admits_notification(
            &notification(NotificationType::RequestApproved, "x"),
            false
        ));
    }

    #[test]
    fn test_filters_combine_by_conjunction() {
        let q = InboxQuery {
            filter: ReadFilter::Unread,
            type_filter: TypeFilter::Gear,
            tab: Tab::All,
        };
        let gear = notification(NotificationType::GearDueSoon, "Your GEAR is due tomorrow");
        let other = notification(NotificationType::RequestApproved, "Request approved");
        assert!(q.admits_notification(&gear, false));
        assert!(!q.admits_notification(&gear, true));
        assert!(!q.admits_notification(&other, false));
    }

    #[test]
    fn test_request_filter_matches_message_case_insensitively() {
        let n = notification(NotificationType::Other, "Your REQUEST was received");
        assert!(TypeFilter::Request.admits(&n));
        assert!(!TypeFilter::System.admits(&n));
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let q: InboxQuery = serde_json::from_str(r#"{"filter":"unread"}"#).unwrap();
        assert_eq!(q.filter, ReadFilter::Unread);
        assert_eq!(q.type_filter, TypeFilter::All);
        assert_eq!(q.tab, Tab::All);

        let q: InboxQuery = serde_json::from_str(r#"{"type":"request","tab":"system"}"#).unwrap();
        assert_eq!(q.type_filter, TypeFilter::Request);
        assert_eq!(q.tab, Tab::System);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!("announcements".parse::<Tab>(), Ok(Tab::Announcements));
        assert!("archived".parse::<Tab>().is_err());
        assert!("read".parse::<ReadFilter>().is_err());
    }
}
