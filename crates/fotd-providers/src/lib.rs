pub mod catalog;
pub mod dates;
pub mod html;
pub mod http;
pub mod provider;
pub mod providers;
pub mod rate_limit;
pub mod registry;
pub mod retry;

pub use dates::Today;
pub use http::{build_shared_client, HttpSession};
pub use provider::{
    select_upcoming, Capabilities, FlavorProvider, UpcomingFlavor, DEFAULT_UPCOMING_DAYS,
};
pub use providers::{
    CulversProvider, GoodberrysProvider, KoppsProvider, LeducsProvider, OscarsProvider,
};
pub use rate_limit::RateLimiter;
pub use registry::{capabilities, create_provider, descriptors, ProviderDescriptor};
pub use retry::{retry_with_backoff, RetryPolicy};
