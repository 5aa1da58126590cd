// commerce_server/src/models/mod.rs

//! Data structures for the storefront entities, in their wire (camelCase JSON)
//! and row (database) shapes.

pub mod chat_session;
pub mod order;
pub mod product;

pub use chat_session::{ChatMessage, ChatSession, MessageRole, NewChatSession, UpdateChatSession};
pub use order::{NewOrder, Order, OrderItem, OrderStatus, UpdateOrderStatus};
pub use product::{NewProduct, Product, ProductPatch};
