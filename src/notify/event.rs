use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fallback text for event types without an entry in the message table.
pub const GENERIC_MESSAGE: &str = "New notification";

/// Domain events admins are notified about.
///
/// The set is open-ended: a type this build does not know is kept verbatim in
/// `Other` so it still reaches the browser, with the generic message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Booking,
    BookingDeleted,
    BookingsArchived,
    BookingRestored,
    Contact,
    ContactDeleted,
    Announcement,
    AnnouncementDeleted,
    TutorAdded,
    TutorDeleted,
    SubjectAdded,
    Other(String),
}

impl EventType {
    pub const KNOWN: [EventType; 11] = [
        EventType::Booking,
        EventType::BookingDeleted,
        EventType::BookingsArchived,
        EventType::BookingRestored,
        EventType::Contact,
        EventType::ContactDeleted,
        EventType::Announcement,
        EventType::AnnouncementDeleted,
        EventType::TutorAdded,
        EventType::TutorDeleted,
        EventType::SubjectAdded,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Booking => "booking",
            EventType::BookingDeleted => "booking_deleted",
            EventType::BookingsArchived => "bookings_archived",
            EventType::BookingRestored => "booking_restored",
            EventType::Contact => "contact",
            EventType::ContactDeleted => "contact_deleted",
            EventType::Announcement => "announcement",
            EventType::AnnouncementDeleted => "announcement_deleted",
            EventType::TutorAdded => "tutor_added",
            EventType::TutorDeleted => "tutor_deleted",
            EventType::SubjectAdded => "subject_added",
            EventType::Other(name) => name,
        }
    }

    /// Human-readable text shown to the admin.
    pub fn message(&self) -> &'static str {
        match self {
            EventType::Booking => "New booking",
            EventType::BookingDeleted => "Booking deleted",
            EventType::BookingsArchived => "Bookings archived",
            EventType::BookingRestored => "Booking restored",
            EventType::Contact => "New message",
            EventType::ContactDeleted => "Contact deleted",
            EventType::Announcement => "New announcement posted",
            EventType::AnnouncementDeleted => "Announcement deleted",
            EventType::TutorAdded => "New tutor added",
            EventType::TutorDeleted => "Tutor removed",
            EventType::SubjectAdded => "New subject added",
            EventType::Other(_) => GENERIC_MESSAGE,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventType::Other(_))
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        EventType::KNOWN
            .iter()
            .find(|known| known.as_str() == name)
            .cloned()
            .unwrap_or_else(|| EventType::Other(name.to_string()))
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        match EventType::from(name.as_str()) {
            EventType::Other(_) => EventType::Other(name),
            known => known,
        }
    }
}

impl From<EventType> for String {
    fn from(event: EventType) -> Self {
        match event {
            EventType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EventType::from(s))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
