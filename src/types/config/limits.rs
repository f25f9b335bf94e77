//! Runtime limit configuration types

use std::num::NonZeroUsize;

nonzero_newtype! {
    /// A non-zero worker thread count
    ///
    /// # Examples
    /// ```
    /// use tunnel_relay::types::ThreadCount;
    ///
    /// let threads = ThreadCount::new(4).unwrap();
    /// assert_eq!(threads.get(), 4);
    /// assert!(ThreadCount::new(0).is_none());
    /// ```
    pub struct ThreadCount(NonZeroUsize: usize, serialize as serialize_u64);
}

impl ThreadCount {
    /// Single worker thread (current-thread runtime)
    pub const SINGLE: Self = Self(NonZeroUsize::new(1).unwrap());
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl std::str::FromStr for ThreadCount {
    type Err = std::num::ParseIntError;

    /// Parse a thread count; `0` selects the number of available CPUs
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.parse::<usize>()?;
        if value == 0 {
            let cpus = std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1);
            return Ok(Self::new(cpus).unwrap_or(Self::SINGLE));
        }
        Ok(Self::new(value).unwrap_or(Self::SINGLE))
    }
}
