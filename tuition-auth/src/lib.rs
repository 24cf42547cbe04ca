pub mod auth;
pub mod cookies;
pub mod session;

pub fn is_default<T: Default + Eq>(val: &T) -> bool {
    *val == T::default()
}
