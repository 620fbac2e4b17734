pub mod consultation;
pub mod message;
pub mod notification;

pub use consultation::{Consultation, ConsultationId};
pub use message::{Message, MessageId, MessageThread, OutgoingMessage, SharedDocument};
pub use notification::{Notification, NotificationId, NotificationSummary};
