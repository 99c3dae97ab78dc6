//! Load and store diagnostics.
//!
//! Non-conforming input that can be repaired (a structure pointer on an
//! entity that forbids one, an entity type without a dedicated variant, a
//! Terminate record whose counts disagree with the file) is recorded as a
//! `Notification` instead of failing the whole operation.
//!
//! After a read or write the caller can inspect
//! [`IgesDocument::notifications`](crate::IgesDocument::notifications).

use std::fmt;

/// Severity level of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// An entity type is read but not modelled.
    NotSupported,
    /// Non-fatal irregularity (e.g., Terminate counts off).
    Warning,
    /// Corrupt data that was repaired in place.
    Corruption,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "NotSupported"),
            Self::Warning => write!(f, "Warning"),
            Self::Corruption => write!(f, "Corruption"),
        }
    }
}

/// A single notification produced during reading or writing.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The severity / category.
    pub notification_type: NotificationType,
    /// DE sequence number of the entity concerned, if any.
    pub sequence: Option<i32>,
    /// A human-readable description of the issue.
    pub message: String,
}

impl Notification {
    /// Create a new notification.
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            sequence: None,
            message: message.into(),
        }
    }

    /// Attach the DE sequence number of the entity concerned.
    pub fn at_entity(mut self, sequence: i32) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sequence {
            Some(sequence) => write!(f, "[{}] DE {}: {}", self.notification_type, sequence, self.message),
            None => write!(f, "[{}] {}", self.notification_type, self.message),
        }
    }
}

/// Collects notifications during a read/write operation.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a notification.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        self.items.push(Notification::new(notification_type, message));
    }

    /// Record a notification about one entity.
    pub fn notify_entity(
        &mut self,
        notification_type: NotificationType,
        sequence: i32,
        message: impl Into<String>,
    ) {
        self.items
            .push(Notification::new(notification_type, message).at_entity(sequence));
    }

    /// Check if there are any notifications.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over all notifications.
    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// Get all notifications of a specific type.
    pub fn of_type(&self, nt: NotificationType) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.notification_type == nt).collect()
    }

    /// Check whether any notification of the given type exists.
    pub fn has_type(&self, nt: NotificationType) -> bool {
        self.items.iter().any(|n| n.notification_type == nt)
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_basics() {
        let mut c = NotificationCollection::new();
        assert!(c.is_empty());

        c.notify(NotificationType::Warning, "terminate counts");
        c.notify_entity(NotificationType::Corruption, 7, "structure pointer cleared");
        c.notify_entity(NotificationType::NotSupported, 9, "type 126");

        assert_eq!(c.len(), 3);
        assert_eq!(c.of_type(NotificationType::Corruption).len(), 1);
        assert!(c.has_type(NotificationType::NotSupported));
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn test_display() {
        let n = Notification::new(NotificationType::Corruption, "structure pointer cleared").at_entity(7);
        assert_eq!(format!("{}", n), "[Corruption] DE 7: structure pointer cleared");
        let n = Notification::new(NotificationType::Warning, "count mismatch");
        assert_eq!(format!("{}", n), "[Warning] count mismatch");
    }
}
