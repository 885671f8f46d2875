pub mod notifier;

pub use notifier::{NotificationChannel, NotifierPlugin};
