pub mod db;
pub mod interpreter_llm;

pub use db::DbAdapter;
pub use interpreter_llm::OpenAiInterpreterAdapter;
