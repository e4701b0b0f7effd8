pub mod event;
pub mod luminary;
pub mod magazine;
pub mod session;
pub mod sponsor;

pub use event::{series_title, sort_upcoming, Countdown, Event};
pub use luminary::{split_roster, Luminary, Roster};
pub use magazine::Magazine;
pub use session::{Session, Speaker};
pub use sponsor::Sponsor;
