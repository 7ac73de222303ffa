pub mod availability;
pub mod booking;
pub mod group_class;
pub mod registration;
pub mod time_window;
pub mod user;

pub use availability::{Availability, AvailabilityKind, AvailabilityKindError};
pub use booking::{PtSession, SessionStatus};
pub use group_class::GroupClass;
pub use registration::{ClassRegistration, RegistrationStatus};
pub use time_window::{Span, TimeWindow, WindowDay, WindowError};
pub use user::{Admin, Member, NewUser, Room, Trainer};
