pub mod dispatcher;
pub mod mailer;
pub mod stats;
pub mod templates;

pub use dispatcher::{FanOutReport, Notifier};
pub use mailer::{MailError, Mailer, OutgoingEmail, SmtpMailer};
