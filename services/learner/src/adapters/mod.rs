pub mod http;
pub mod notifier;
pub mod store;
pub mod wire;

pub use http::HttpLearningAdapter;
pub use notifier::ChannelNotifier;
pub use store::JsonFileStore;
