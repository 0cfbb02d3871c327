pub mod chat;
pub mod groq;
