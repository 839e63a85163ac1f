//! Interning of token text.
//!
//! A [`StringTable`] deduplicates text by content so repeated identifiers
//! share one allocation. Tables are checked out of a [`StringPool`] for the
//! lifetime of one scanner session and handed back when the session ends.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Tables kept around for reuse.
const MAX_POOLED_TABLES: usize = 16;

/// Tables grown past this many entries are cleared before going back.
const MAX_RETAINED_ENTRIES: usize = 16 * 1024;

/// Content-keyed set of shared strings.
#[derive(Default)]
pub struct StringTable {
    set: FxHashSet<Arc<str>>,
    scratch: String,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared copy of `text`, allocating only on first sight.
    pub fn intern(&mut self, text: &str) -> Arc<str> {
        if let Some(existing) = self.set.get(text) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(text);
        self.set.insert(Arc::clone(&shared));
        shared
    }

    /// Intern a slice of the scanner's character buffer.
    ///
    /// The characters are collected into a reused scratch buffer, so a hit
    /// costs no allocation.
    pub fn intern_chars(&mut self, chars: &[char]) -> Arc<str> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(chars);
        let shared = self.intern(&scratch);
        self.scratch = scratch;
        shared
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn clear(&mut self) {
        self.set.clear();
        self.scratch = String::new();
    }
}

impl fmt::Debug for StringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringTable")
            .field("len", &self.set.len())
            .finish()
    }
}

static SHARED_POOL: Lazy<StringPool> = Lazy::new(StringPool::new);

/// Pool of string tables shared between scanner sessions.
///
/// Cloning the pool clones the handle; all clones see the same tables.
/// Each checkout is exclusive, so concurrent sessions never share a table.
#[derive(Clone, Default)]
pub struct StringPool {
    tables: Arc<Mutex<Vec<StringTable>>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pool used when a scanner is not given one.
    pub fn shared() -> StringPool {
        SHARED_POOL.clone()
    }

    /// Check out a table, reusing a pooled one when available.
    pub fn acquire(&self) -> PooledStringTable {
        let table = self.tables.lock().pop().unwrap_or_default();
        trace!(entries = table.len(), "string table checked out");
        PooledStringTable {
            table,
            pool: self.clone(),
        }
    }

    /// Number of tables currently waiting for reuse.
    pub fn available(&self) -> usize {
        self.tables.lock().len()
    }

    fn release(&self, mut table: StringTable) {
        if table.len() > MAX_RETAINED_ENTRIES {
            table.clear();
        }
        let mut tables = self.tables.lock();
        if tables.len() < MAX_POOLED_TABLES {
            trace!(entries = table.len(), "string table returned");
            tables.push(table);
        }
    }
}

impl fmt::Debug for StringPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringPool")
            .field("available", &self.available())
            .finish()
    }
}

/// A checked-out [`StringTable`], returned to its pool on drop.
pub struct PooledStringTable {
    table: StringTable,
    pool: StringPool,
}

impl Deref for PooledStringTable {
    type Target = StringTable;

    fn deref(&self) -> &StringTable {
        &self.table
    }
}

impl DerefMut for PooledStringTable {
    fn deref_mut(&mut self) -> &mut StringTable {
        &mut self.table
    }
}

impl Drop for PooledStringTable {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.table));
    }
}

impl fmt::Debug for PooledStringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.table.fmt(f)
    }
}
