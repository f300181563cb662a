pub mod formatter;
pub mod notifiers;
pub mod traits;

pub use formatter::format_deltas;
pub use notifiers::DiscordNotifier;
pub use traits::NotifierPlugin;
