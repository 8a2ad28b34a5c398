pub mod order;
pub mod promo;
pub mod value_objects;
