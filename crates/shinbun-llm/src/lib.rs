pub mod mock;
pub mod openai;
pub mod reliable;

pub use mock::{MockDigestClient, MockResponse};
pub use openai::{OpenAiConfig, OpenAiDigestClient};
pub use reliable::{ReliableConfig, ReliableDigestClient};
