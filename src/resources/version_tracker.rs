/// Version tracker - used to mark resource changes.
///
/// Every CPU-side resource owns one. Mutating the resource bumps the version;
/// renderer-side caches remember the version they last uploaded and re-upload
/// only when the resource has moved past it. The cache never polls resource
/// contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTracker {
    version: u64,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { version: 1 }
    }

    /// Marks as modified, increments version by 1
    pub fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Gets the current version number
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
