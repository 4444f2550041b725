use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A system-generated event record shown in a user's inbox.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    /// `None` for notifications addressed to every user.
    pub user_id: Option<Uuid>,
    #[sqlx(rename = "type", try_from = "String")]
    pub r#type: NotificationType, // 'type' is a reserved keyword
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    RequestApproved,
    RequestRejected,
    GearDueSoon,
    GearOverdue,
    NewAnnouncement,
    System,
    #[serde(other)]
    Other,
}

/// Visual weight of a notification type, used by clients to pick colours.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
    Muted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RequestApproved => "request_approved",
            NotificationType::RequestRejected => "request_rejected",
            NotificationType::GearDueSoon => "gear_due_soon",
            NotificationType::GearOverdue => "gear_overdue",
            NotificationType::NewAnnouncement => "new_announcement",
            NotificationType::System => "system",
            NotificationType::Other => "other",
        }
    }

    /// Icon key rendered next to the notification.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationType::RequestApproved => "check-circle",
            NotificationType::RequestRejected => "shield-alert",
            NotificationType::GearDueSoon => "clock",
            NotificationType::GearOverdue => "alert-triangle",
            NotificationType::NewAnnouncement => "megaphone",
            NotificationType::System => "info",
            NotificationType::Other => "bell-ring",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            NotificationType::RequestApproved => Severity::Success,
            NotificationType::RequestRejected | NotificationType::GearOverdue => Severity::Danger,
            NotificationType::GearDueSoon => Severity::Warning,
            NotificationType::NewAnnouncement | NotificationType::System => Severity::Info,
            NotificationType::Other => Severity::Muted,
        }
    }
}

impl From<&str> for NotificationType {
    fn from(s: &str) -> Self {
        match s {
            "request_approved" => NotificationType::RequestApproved,
            "request_rejected" => NotificationType::RequestRejected,
            "gear_due_soon" => NotificationType::GearDueSoon,
            "gear_overdue" => NotificationType::GearOverdue,
            "new_announcement" => NotificationType::NewAnnouncement,
            "system" => NotificationType::System,
            _ => NotificationType::Other,
        }
    }
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        NotificationType::from(s.as_str())
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_maps_to_other() {
        assert_eq!(NotificationType::from("gear_lost"), NotificationType::Other);
        let parsed: NotificationType = serde_json::from_str("\"gear_lost\"").unwrap();
        assert_eq!(parsed, NotificationType::Other);
    }

    #[test]
    fn test_type_roundtrips_through_str() {
        for t in [
            NotificationType::RequestApproved,
            NotificationType::RequestRejected,
            NotificationType::GearDueSoon,
            NotificationType::GearOverdue,
            NotificationType::NewAnnouncement,
            NotificationType::System,
        ] {
            assert_eq!(NotificationType::from(t.as_str()), t);
        }
    }

    #[test]
    fn test_overdue_is_danger() {
        assert_eq!(NotificationType::GearOverdue.severity(), Severity::Danger);
        assert_eq!(NotificationType::GearOverdue.icon(), "alert-triangle");
    }
}
