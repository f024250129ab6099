/// Race-guarded listing fetch state.
///
/// Every filter change starts a new fetch generation; responses carry
/// their generation back and only the newest issued generation may land.
/// A stale response resolving after a newer request is discarded instead
/// of clobbering the grid (newest-wins, not last-resolved-wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Debug)]
pub struct ListingFetcher<T> {
    latest: u64,
    data: Option<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for ListingFetcher<T> {
    fn default() -> Self {
        Self {
            latest: 0,
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> ListingFetcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch: issues the next generation token, raises the
    /// loading flag and clears any prior error.
    pub fn begin(&mut self) -> Generation {
        self.latest += 1;
        self.loading = true;
        self.error = None;
        Generation(self.latest)
    }

    /// Apply a successful response. Returns false (and changes nothing)
    /// when the token is not the newest issued generation.
    pub fn try_apply(&mut self, generation: Generation, data: T) -> bool {
        if generation.0 != self.latest {
            return false;
        }
        self.data = Some(data);
        self.loading = false;
        self.error = None;
        true
    }

    /// Record a failed response: stores the message and clears the
    /// loading flag. No retry. Stale failures are discarded the same way
    /// stale successes are.
    pub fn try_fail(&mut self, generation: Generation, message: impl Into<String>) -> bool {
        if generation.0 != self.latest {
            return false;
        }
        self.error = Some(message.into());
        self.loading = false;
        true
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
