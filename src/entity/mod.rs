pub mod addresses;
pub mod blog_categories;
pub mod cart_items;
pub mod carts;
pub mod colors;
pub mod favorites;
pub mod order_items;
pub mod orders;
pub mod phone_otps;
pub mod post_comments;
pub mod posts;
pub mod product_colors;
pub mod products;
pub mod users;

pub use addresses::Entity as Addresses;
pub use blog_categories::Entity as BlogCategories;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use colors::Entity as Colors;
pub use favorites::Entity as Favorites;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use phone_otps::Entity as PhoneOtps;
pub use post_comments::Entity as PostComments;
pub use posts::Entity as Posts;
pub use product_colors::Entity as ProductColors;
pub use products::Entity as Products;
pub use users::Entity as Users;
