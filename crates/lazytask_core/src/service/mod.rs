//! Use-case services over the parser and the task store.

pub mod task_service;
