#[cfg(all(test, not(any(loom, shuttle))))]
mod macros;
mod models;

#[cfg(all(test, not(any(loom, shuttle))))]
pub(crate) use self::macros::each_capacity;
pub(crate) use self::models::alloc;
pub(crate) use self::models::cell;
pub(crate) use self::models::sync;
