pub mod factory;
pub mod openai;

pub use factory::create_chat;
pub use openai::OpenAiChat;
