use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// Marks which cached values count as "no result".
///
/// Caches configured with `cache_none(false)` never reuse a null value.
/// Types that can't be null use the default and implement the trait with an
/// empty body:
///
/// ```
/// use iotcal_core::cache::Nullable;
///
/// #[derive(Clone)]
/// struct Forecast {
///     temperatures: Vec<f64>,
/// }
///
/// impl Nullable for Forecast {}
///
/// assert!(!Forecast { temperatures: vec![] }.is_null());
/// assert!(None::<Forecast>.is_null());
/// ```
pub trait Nullable {
    fn is_null(&self) -> bool {
        false
    }
}

impl<T> Nullable for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl<T: Nullable + ?Sized> Nullable for Box<T> {
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

impl<T: Nullable + ?Sized> Nullable for Arc<T> {
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

impl<T: Nullable + ?Sized> Nullable for Rc<T> {
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

macro_rules! never_null {
    ($($ty:ty),* $(,)?) => {
        $(impl Nullable for $ty {})*
    };
}

never_null!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T> Nullable for Vec<T> {}
impl<T> Nullable for VecDeque<T> {}
impl<T> Nullable for [T] {}
impl<K, V, S> Nullable for HashMap<K, V, S> {}
impl<K, V> Nullable for BTreeMap<K, V> {}
impl<T, S> Nullable for HashSet<T, S> {}
impl<T> Nullable for BTreeSet<T> {}

impl<A, B> Nullable for (A, B) {}
impl<A, B, C> Nullable for (A, B, C) {}
impl<A, B, C, D> Nullable for (A, B, C, D) {}
