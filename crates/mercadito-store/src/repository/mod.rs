//! # Repository Module
//!
//! Typed repositories over the document collections. Each repository
//! owns the validation and logging for its entity; callers never touch
//! raw collections for catalog or registry writes.

pub mod category;
pub mod client;
pub mod product;

pub use category::{CategoryPatch, CategoryRepository, NewCategory};
pub use client::{ClientPatch, ClientRepository, NewClient};
pub use product::{NewProduct, ProductPatch, ProductRepository};
