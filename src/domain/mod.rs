pub mod account;
pub mod activity;
pub mod order;
pub mod product;

pub use account::{Account, NewAccount, UserSummary};
pub use activity::{Activity, ActivityType, NewActivity, NewSession, Session};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, PaymentMethod, PaymentResult, ShippingAddress,
};
pub use product::{Category, NewProduct, Product, ProductSummary};
