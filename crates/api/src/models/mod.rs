//! Domain models for the Sugarloaf API.
//!
//! These are the in-memory representations used by routes and services.
//! Database row structs live in the `db` module and convert into these
//! types at the repository boundary.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use cart::{AddItemInput, Cart, CartItem, CartItemAction, ProductSummary, UpdateItemInput};
pub use coupon::{Coupon, CouponSummary, CouponValidation, CreateCouponInput};
pub use order::{
    Address, CreateOrderInput, Order, OrderItem, OrderItemInput, Tracking, TrackingInput,
};
pub use payment::{Payment, ProcessPaymentInput, Refund, RefundInput};
pub use product::{CreateProductInput, PageMeta, Product, ProductFilter, UpdateProductInput};
pub use user::{CurrentUser, LoginInput, RegisterInput, User, session_keys};
