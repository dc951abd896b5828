use crate::key::CacheKey;
use factgate_domain::outcome::FactResult;

/// Blocking producer of section values.
///
/// Implementations may call into native APIs and block; they always run on the blocking pool.
/// Any `Fn(&CacheKey) -> FactResult<T>` closure is a source.
pub trait FactSource<T>: Send + Sync + 'static {
    fn compute(&self, key: &CacheKey) -> FactResult<T>;
}

impl<T, F> FactSource<T> for F
where
    F: Fn(&CacheKey) -> FactResult<T> + Send + Sync + 'static,
{
    fn compute(&self, key: &CacheKey) -> FactResult<T> {
        self(key)
    }
}
