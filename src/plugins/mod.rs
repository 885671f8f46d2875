pub mod dispatcher;
pub mod notifiers;
pub mod traits;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use traits::{NotificationChannel, NotifierPlugin};
