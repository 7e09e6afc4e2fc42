use tracing::info;

use crate::notify::EventType;

/// Page sections that can be reloaded in response to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTarget {
    Bookings,
    Contacts,
    Announcements,
    Tutors,
    Subjects,
    Stats,
}

/// Sections affected by `event`. Unknown events refresh nothing.
pub fn refresh_targets(event: &EventType) -> &'static [RefreshTarget] {
    use RefreshTarget::*;

    match event {
        EventType::Booking
        | EventType::BookingDeleted
        | EventType::BookingsArchived
        | EventType::BookingRestored => &[Bookings, Stats],
        EventType::Contact | EventType::ContactDeleted => &[Contacts, Stats],
        EventType::Announcement | EventType::AnnouncementDeleted => &[Announcements, Stats],
        EventType::TutorAdded | EventType::TutorDeleted => &[Tutors, Stats],
        EventType::SubjectAdded => &[Subjects, Stats],
        EventType::Other(_) => &[],
    }
}

/// The admin page an agent serves. Pages ignore targets they do not render.
pub trait AdminPage: Send {
    fn refresh(&mut self, target: RefreshTarget);

    /// The credential is missing, unreadable or expired.
    fn redirect_to_login(&mut self);
}

/// Page stand-in for the command line: reports refreshes to the log.
#[derive(Debug, Default)]
pub struct LogPage;

impl AdminPage for LogPage {
    fn refresh(&mut self, target: RefreshTarget) {
        info!(section = ?target, "Refreshing section");
    }

    fn redirect_to_login(&mut self) {
        info!("Login required: run `learnhub-notify login --token <token>`");
    }
}
