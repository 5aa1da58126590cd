// commerce_server/src/web/handlers/mod.rs

pub mod chat_handlers;
pub mod chat_session_handlers;
pub mod docs_handlers;
pub mod graph_handlers;
pub mod order_handlers;
pub mod product_handlers;
