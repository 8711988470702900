//! Persistent entities and the view types the API returns.

pub mod address;
pub mod cart_item;
pub mod catalog;
pub mod order;
pub mod pagination;
pub mod product;
pub mod requests;
pub mod user;
pub mod wishlist;

pub use address::{Address, AddressDraft};
pub use cart_item::{CartItem, CartLine, CartView};
pub use catalog::{Brand, Category, TaxonomyDraft};
pub use order::{
  CustomerRef, DashboardStats, NewOrder, NewOrderLine, Order, OrderDetail, OrderItem, OrderLine, OrderStatus,
  PaymentMethod,
};
pub use pagination::{Page, PageQuery, PageRequest, Pagination};
pub use product::{slugify, NewProduct, Product, ProductDetail, ProductFilter, ProductSort, SortOrder};
pub use user::{Capability, CustomerSummary, NewUser, Role, User, UserProfile};
pub use wishlist::{WishlistEntry, WishlistItem};
