// ABOUTME: ResourceGuard - counting admission gate with a hard ceiling on granted slots.
// ABOUTME: Admission is a lock-free compare-and-increment; failed saves release their slot.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::saver::Saver;

/// Outcome of [`ResourceGuard::perform_guarded_work`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// A slot was granted and the save succeeded. The slot stays consumed.
    Saved,
    /// A slot was granted but the save failed; the slot was handed back.
    Released { reason: String },
    /// A slot was granted but the save was abandoned on cancel; the slot was handed back.
    Cancelled,
    /// No slot was available. The limit has been reached.
    Denied,
}

impl Admission {
    /// True if a slot was granted, regardless of how the save went.
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Denied)
    }
}

/// Counters describing every admission attempt the guard has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStats {
    /// Calls to `try_admit` that returned true.
    pub admitted: u64,
    /// Calls to `try_admit` that returned false.
    pub denied: u64,
    /// Slots handed back through `release`, from failed or cancelled saves.
    pub released: u64,
}

impl GuardStats {
    /// Total admission attempts.
    pub fn attempts(&self) -> u64 {
        self.admitted + self.denied
    }

    /// Admissions whose slot was kept.
    pub fn saved(&self) -> u64 {
        self.admitted.saturating_sub(self.released)
    }
}

/// A counting admission gate.
///
/// At most `limit` slots are held at any time. Once every slot is held and
/// none is released, all further admissions are denied for good.
#[derive(Debug)]
pub struct ResourceGuard {
    limit: usize,
    granted: AtomicUsize,
    admitted: AtomicU64,
    denied: AtomicU64,
    released: AtomicU64,
}

impl ResourceGuard {
    /// Create a guard that grants at most `limit` slots.
    pub fn new(limit: usize) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }

        Ok(Self {
            limit,
            granted: AtomicUsize::new(0),
            admitted: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            released: AtomicU64::new(0),
        })
    }

    /// Try to take a slot without waiting.
    pub fn try_admit(&self) -> bool {
        let admitted = self
            .granted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |granted| {
                (granted < self.limit).then_some(granted + 1)
            })
            .is_ok();

        if admitted {
            self.admitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
        admitted
    }

    /// Hand a slot back. Returns false, changing nothing, if no slot is held.
    pub fn release(&self) -> bool {
        let released = self
            .granted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |granted| {
                granted.checked_sub(1)
            })
            .is_ok();

        if released {
            self.released.fetch_add(1, Ordering::Relaxed);
        }
        released
    }

    /// Admit, then run `saver` on `item`.
    ///
    /// A failed save is logged and its slot released; the caller still gets
    /// an admitted outcome. Only [`Admission::Denied`] means the limit was hit.
    pub async fn perform_guarded_work<T, S>(&self, item: &T, saver: &S) -> Admission
    where
        T: Sync,
        S: Saver<T> + ?Sized,
    {
        self.perform_guarded_work_with_cancel(item, saver, std::future::pending())
            .await
    }

    /// Like [`perform_guarded_work`](Self::perform_guarded_work), but abandons
    /// the save if `cancel` completes first. The abandoned save's slot is
    /// released and [`Admission::Cancelled`] is returned.
    pub async fn perform_guarded_work_with_cancel<T, S, C>(
        &self,
        item: &T,
        saver: &S,
        cancel: C,
    ) -> Admission
    where
        T: Sync,
        S: Saver<T> + ?Sized,
        C: Future<Output = ()>,
    {
        if !self.try_admit() {
            debug!(limit = self.limit, "admission denied");
            return Admission::Denied;
        }

        let save = saver.save(item);
        tokio::pin!(cancel);

        let result = tokio::select! {
            biased;
            () = &mut cancel => {
                debug!("save cancelled, releasing admission slot");
                self.release();
                return Admission::Cancelled;
            }
            result = save => result,
        };

        match result {
            Ok(()) => Admission::Saved,
            Err(e) => {
                warn!(error = %e, "save failed, releasing admission slot");
                self.release();
                Admission::Released {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently held.
    pub fn granted(&self) -> usize {
        self.granted.load(Ordering::Acquire)
    }

    /// Slots still available.
    pub fn available(&self) -> usize {
        self.limit - self.granted()
    }

    pub fn stats(&self) -> GuardStats {
        GuardStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}
