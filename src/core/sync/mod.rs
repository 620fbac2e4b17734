pub mod alerts;
pub mod consultations;
pub mod gate;
pub mod notifications;
pub mod poller;
pub mod reconcile;
pub mod summary;

pub use alerts::{Alert, AlertCenter, AlertKind};
pub use consultations::{
    Confirmation, ConsultationSnapshot, ConsultationSync, EndOutcome, RejectOutcome, SendOutcome,
};
pub use notifications::{NotificationSnapshot, NotificationSync};
pub use poller::{PollKind, PollerHandle, spawn_poller};
