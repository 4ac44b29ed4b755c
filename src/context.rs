use crate::controller::ObjectFetcher;
use crate::traits::{FileSystem, Output, RealFileSystem, TerminalOutput};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub output: Arc<dyn Output>,
    pub fetcher: Arc<dyn ObjectFetcher>,
}

impl Context {
    /// Create a new context with real filesystem and terminal output
    pub fn new(fetcher: Arc<dyn ObjectFetcher>) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            output: Arc::new(TerminalOutput),
            fetcher,
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        output: Arc<dyn Output>,
        fetcher: Arc<dyn ObjectFetcher>,
    ) -> Self {
        Self {
            fs,
            output,
            fetcher,
        }
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            output: Arc::clone(&self.output),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}
