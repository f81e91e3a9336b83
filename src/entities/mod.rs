/// Storefront entities module
pub mod address;
pub mod brand;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod coupon;
pub mod product;
pub mod product_image;
pub mod user;

// Re-export entities
pub use address::{Entity as Address, Model as AddressModel};
pub use brand::{Entity as Brand, Model as BrandModel};
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use coupon::{CouponValidity, DiscountType, Entity as Coupon, Model as CouponModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use user::{Entity as User, Model as UserModel};
