//! Configuration module

mod site;

pub use site::configured;
pub use site::HighlightConfig;
pub use site::RemoteConfig;
pub use site::ServerConfig;
pub use site::SocialLink;
pub use site::SiteConfig;
pub use site::WidgetConfig;
