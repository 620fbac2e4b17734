pub mod client;
pub mod consultations;
pub mod notifications;

pub use client::ApiClient;
pub use consultations::ConsultationApi;
pub use notifications::NotificationApi;
