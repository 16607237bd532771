// In-memory implementations of the relay stores.

pub mod in_memory_block_list;
pub mod in_memory_question_store;

pub use in_memory_block_list::InMemoryBlockList;
pub use in_memory_question_store::InMemoryQuestionStore;
