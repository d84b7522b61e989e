pub mod http_probe;
pub mod telegram;
pub mod vk_search;

pub use http_probe::HttpProbeAdapter;
pub use telegram::TelegramAdapter;
pub use vk_search::VkSearchAdapter;
