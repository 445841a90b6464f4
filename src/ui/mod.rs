pub mod icons;
pub mod loader;
pub mod notify;

pub use loader::{Loader, LoaderGuard, NoopLoader, SpinnerLoader};
pub use notify::{ConsoleNotifier, Level, Notification, Notifier};
